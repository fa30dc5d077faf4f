use mentor_match_domain::availability_service::{AvailabilityPreset, RuleEdit};
use shared::AvailabilityRule;
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct AvailabilityEditorProps {
    pub rules: Vec<AvailabilityRule>,
    pub saving: bool,
    /// False until the stored rules arrived; saving is blocked before that
    pub loaded: bool,
    pub on_edit: Callback<(u8, RuleEdit)>,
    pub on_preset: Callback<AvailabilityPreset>,
    pub on_save: Callback<()>,
}

/// Per-weekday availability rows with presets and a save button
#[function_component(AvailabilityEditor)]
pub fn availability_editor(props: &AvailabilityEditorProps) -> Html {
    let preset_button = |preset: AvailabilityPreset, label: &str| {
        let on_preset = props.on_preset.clone();
        html! {
            <button class="secondary-button" onclick={Callback::from(move |_: MouseEvent| on_preset.emit(preset))}>
                { label.to_string() }
            </button>
        }
    };

    let on_save = {
        let on_save = props.on_save.clone();
        Callback::from(move |_: MouseEvent| on_save.emit(()))
    };

    html! {
        <div class="availability-editor">
            <div class="editor-toolbar">
                { preset_button(AvailabilityPreset::WeekdaysOnly, "Weekdays only") }
                { preset_button(AvailabilityPreset::WeekendsOnly, "Weekends only") }
            </div>
            <table class="rules-table">
                <thead>
                    <tr>
                        <th>{ "Day" }</th>
                        <th>{ "Available" }</th>
                        <th>{ "Start" }</th>
                        <th>{ "End" }</th>
                    </tr>
                </thead>
                <tbody>
                    { for props.rules.iter().map(|rule| {
                        let day = rule.day_of_week;
                        let on_available = {
                            let on_edit = props.on_edit.clone();
                            Callback::from(move |e: Event| {
                                let input: HtmlInputElement = e.target_unchecked_into();
                                on_edit.emit((day, RuleEdit::Available(input.checked())));
                            })
                        };
                        let on_start = {
                            let on_edit = props.on_edit.clone();
                            Callback::from(move |e: Event| {
                                let input: HtmlInputElement = e.target_unchecked_into();
                                on_edit.emit((day, RuleEdit::StartTime(input.value())));
                            })
                        };
                        let on_end = {
                            let on_edit = props.on_edit.clone();
                            Callback::from(move |e: Event| {
                                let input: HtmlInputElement = e.target_unchecked_into();
                                on_edit.emit((day, RuleEdit::EndTime(input.value())));
                            })
                        };
                        html! {
                            <tr key={day.to_string()} class={classes!((!rule.is_available).then_some("muted"))}>
                                <td>{ rule.day_name() }</td>
                                <td><input type="checkbox" checked={rule.is_available} onchange={on_available} /></td>
                                <td>
                                    <input type="time" disabled={!rule.is_available}
                                           value={AvailabilityRule::short_time(&rule.start_time).to_string()}
                                           onchange={on_start} />
                                </td>
                                <td>
                                    <input type="time" disabled={!rule.is_available}
                                           value={AvailabilityRule::short_time(&rule.end_time).to_string()}
                                           onchange={on_end} />
                                </td>
                            </tr>
                        }
                    }) }
                </tbody>
            </table>
            <button class="primary-button" disabled={props.saving || !props.loaded} onclick={on_save}>
                { if props.saving { "Saving..." } else { "Save Availability" } }
            </button>
        </div>
    }
}
