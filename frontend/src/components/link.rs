use yew::prelude::*;

use crate::context::AppContext;
use crate::route::Route;

#[derive(Properties, PartialEq)]
pub struct LinkProps {
    pub to: Route,
    #[prop_or_default]
    pub class: Classes,
    #[prop_or_default]
    pub children: Html,
}

/// Anchor that navigates through browser history instead of reloading
#[function_component(Link)]
pub fn link(props: &LinkProps) -> Html {
    let context = use_context::<AppContext>();
    let onclick = {
        let to = props.to;
        let navigate = context.map(|ctx| ctx.navigate);
        Callback::from(move |e: MouseEvent| {
            if let Some(navigate) = &navigate {
                e.prevent_default();
                navigate.emit(to);
            }
        })
    };

    html! {
        <a href={props.to.path()} class={props.class.clone()} {onclick}>
            { props.children.clone() }
        </a>
    }
}

#[derive(Properties, PartialEq)]
pub struct RedirectProps {
    pub to: Route,
}

/// Navigate to `to` as soon as it is mounted
#[function_component(Redirect)]
pub fn redirect(props: &RedirectProps) -> Html {
    let context = use_context::<AppContext>();
    use_effect_with(props.to, move |to| {
        if let Some(ctx) = context {
            ctx.navigate.emit(*to);
        }
        || ()
    });
    html! {}
}
