use yew::prelude::*;

use crate::hooks::use_toasts::{Toast, ToastHandle};

#[derive(Properties, PartialEq)]
pub struct ToasterProps {
    pub toasts: Vec<Toast>,
    pub handle: ToastHandle,
}

/// Transient messages stacked in the bottom-right corner
#[function_component(Toaster)]
pub fn toaster(props: &ToasterProps) -> Html {
    html! {
        <div class="toaster toaster-bottom-right">
            { for props.toasts.iter().map(|toast| {
                let handle = props.handle.clone();
                let id = toast.id;
                let on_close = Callback::from(move |_: MouseEvent| handle.dismiss(id));
                html! {
                    <div key={toast.id.to_string()} class={toast.kind.css_class()} role="status">
                        <span class="toast-message">{ &toast.message }</span>
                        <button class="toast-close" onclick={on_close}>{ "×" }</button>
                    </div>
                }
            }) }
        </div>
    }
}
