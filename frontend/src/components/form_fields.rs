//! Two-way binding helpers for form controls backed by `use_state`.

use web_sys::{HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::prelude::*;

pub fn bind_input(state: &UseStateHandle<String>) -> Callback<InputEvent> {
    let state = state.clone();
    Callback::from(move |e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        state.set(input.value());
    })
}

pub fn bind_textarea(state: &UseStateHandle<String>) -> Callback<InputEvent> {
    let state = state.clone();
    Callback::from(move |e: InputEvent| {
        let area: HtmlTextAreaElement = e.target_unchecked_into();
        state.set(area.value());
    })
}

pub fn bind_select(state: &UseStateHandle<String>) -> Callback<Event> {
    let state = state.clone();
    Callback::from(move |e: Event| {
        let select: HtmlSelectElement = e.target_unchecked_into();
        state.set(select.value());
    })
}

/// Value of a `<select>` change event
pub fn select_value(e: &Event) -> String {
    let select: HtmlSelectElement = e.target_unchecked_into();
    select.value()
}

#[derive(Properties, PartialEq)]
pub struct RatingInputProps {
    pub value: u8,
    pub on_change: Callback<u8>,
}

/// Five clickable stars
#[function_component(RatingInput)]
pub fn rating_input(props: &RatingInputProps) -> Html {
    html! {
        <div class="rating-input">
            { for (1..=5u8).map(|star| {
                let on_change = props.on_change.clone();
                let class = if star <= props.value { "star filled" } else { "star" };
                html! {
                    <button type="button" {class} onclick={Callback::from(move |_: MouseEvent| on_change.emit(star))}>
                        { "★" }
                    </button>
                }
            }) }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SpinnerProps {
    #[prop_or(AttrValue::Static("Loading..."))]
    pub label: AttrValue,
}

#[function_component(Spinner)]
pub fn spinner(props: &SpinnerProps) -> Html {
    html! {
        <div class="loading">
            <div class="loading-spinner"></div>
            <p>{ props.label.clone() }</p>
        </div>
    }
}
