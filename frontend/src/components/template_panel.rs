use chrono::Utc;
use mentor_match_domain::template_service::{
    BulkOperation, SortDirection, TemplateFilter, TemplateSelection, TemplateService,
    TemplateSortKey,
};
use mentor_match_domain::export_service::ExportService;
use shared::{ChecklistTemplate, SharedTemplate, TemplateFeedback, TemplateStats, TemplateVersion};
use std::collections::HashMap;
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::components::form_fields::{bind_input, bind_select, bind_textarea, select_value, RatingInput};
use crate::components::modal::Modal;
use crate::context::AppContext;
use crate::services::date_utils::format_session_date;
use crate::services::download::{download_file, read_selected_file};
use crate::services::logging::Logger;

/// Dialog opened from a template card or the toolbar
#[derive(Debug, Clone, PartialEq)]
enum TemplateDialog {
    None,
    NewCategory,
    MoveSelected,
    Versions(ChecklistTemplate),
    Share(ChecklistTemplate),
    Feedback(ChecklistTemplate),
    SharedWithMe,
}

#[derive(Properties, PartialEq)]
pub struct TemplatePanelProps {
    pub mentor_id: Uuid,
    pub templates: Vec<ChecklistTemplate>,
    pub stats: Vec<TemplateStats>,
    /// Templates changed and should be reloaded
    pub on_changed: Callback<()>,
}

#[function_component(TemplatePanel)]
pub fn template_panel(props: &TemplatePanelProps) -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };

    let filter = use_state(TemplateFilter::default);
    let selection = use_state(TemplateSelection::default);
    let categories = use_state(Vec::<String>::new);
    let dialog = use_state(|| TemplateDialog::None);

    let new_category = use_state(String::new);
    let move_target = use_state(String::new);
    let share_email = use_state(String::new);
    let versions = use_state(Vec::<TemplateVersion>::new);
    let shared = use_state(Vec::<SharedTemplate>::new);
    let feedback = use_state(HashMap::<Uuid, TemplateFeedback>::new);
    let my_rating = use_state(|| 0u8);
    let my_comment = use_state(String::new);
    let categories_version = use_state(|| 0u32);

    {
        let client = ctx.client.clone();
        let toasts = ctx.toasts.clone();
        let categories = categories.clone();
        use_effect_with((props.mentor_id, *categories_version), move |(mentor_id, _)| {
            let mentor_id = *mentor_id;
            spawn_local(async move {
                match TemplateService::new(client).categories(mentor_id).await {
                    Ok(loaded) => categories.set(loaded),
                    Err(e) => toasts.failure("Load categories failed", &e, "Failed to load categories"),
                }
            });
            || ()
        });
    }

    let visible = filter.apply(&props.templates, &props.stats);
    let close_dialog = {
        let dialog = dialog.clone();
        Callback::from(move |_: ()| dialog.set(TemplateDialog::None))
    };

    // Toolbar

    let on_search = {
        let filter = filter.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut next = (*filter).clone();
            next.query = input.value();
            filter.set(next);
        })
    };

    let on_category_filter = {
        let filter = filter.clone();
        Callback::from(move |e: Event| {
            let value = select_value(&e);
            let mut next = (*filter).clone();
            next.category = (!value.is_empty()).then_some(value);
            filter.set(next);
        })
    };

    let on_sort_key = {
        let filter = filter.clone();
        Callback::from(move |e: Event| {
            let mut next = (*filter).clone();
            next.sort_key = TemplateSortKey::from_str(&select_value(&e));
            filter.set(next);
        })
    };

    let on_toggle_direction = {
        let filter = filter.clone();
        Callback::from(move |_: MouseEvent| {
            let mut next = (*filter).clone();
            next.direction = next.direction.toggled();
            filter.set(next);
        })
    };

    let on_select_all = {
        let selection = selection.clone();
        let visible = visible.clone();
        Callback::from(move |_: Event| {
            let mut next = (*selection).clone();
            next.toggle_all(&visible);
            selection.set(next);
        })
    };

    let on_bulk_delete = {
        let ctx = ctx.clone();
        let selection = selection.clone();
        let on_changed = props.on_changed.clone();
        Callback::from(move |_: MouseEvent| {
            let ids = selection.ids();
            if ids.is_empty() {
                return;
            }
            let ctx = ctx.clone();
            let selection = selection.clone();
            let on_changed = on_changed.clone();
            spawn_local(async move {
                match TemplateService::new(ctx.client.clone()).bulk(&BulkOperation::Delete, &ids).await {
                    Ok(()) => {
                        ctx.toasts.success(format!("Deleted {} templates", ids.len()));
                        selection.set(TemplateSelection::default());
                        on_changed.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Bulk delete failed", &e, "Failed to delete templates"),
                }
            });
        })
    };

    let on_bulk_move = {
        let ctx = ctx.clone();
        let selection = selection.clone();
        let move_target = move_target.clone();
        let dialog = dialog.clone();
        let on_changed = props.on_changed.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let ids = selection.ids();
            let target = (*move_target).clone();
            if ids.is_empty() || target.is_empty() {
                ctx.toasts.error("Please choose a category");
                return;
            }
            let ctx = ctx.clone();
            let selection = selection.clone();
            let dialog = dialog.clone();
            let on_changed = on_changed.clone();
            spawn_local(async move {
                let operation = BulkOperation::MoveTo(target.clone());
                match TemplateService::new(ctx.client.clone()).bulk(&operation, &ids).await {
                    Ok(()) => {
                        ctx.toasts.success(format!("Moved {} templates to {}", ids.len(), target));
                        selection.set(TemplateSelection::default());
                        dialog.set(TemplateDialog::None);
                        on_changed.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Bulk move failed", &e, "Failed to move templates"),
                }
            });
        })
    };

    let on_add_category = {
        let ctx = ctx.clone();
        let new_category = new_category.clone();
        let dialog = dialog.clone();
        let categories_version = categories_version.clone();
        let mentor_id = props.mentor_id;
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let ctx = ctx.clone();
            let new_category = new_category.clone();
            let dialog = dialog.clone();
            let categories_version = categories_version.clone();
            spawn_local(async move {
                match TemplateService::new(ctx.client.clone())
                    .add_category(mentor_id, &new_category)
                    .await
                {
                    Ok(()) => {
                        ctx.toasts.success("Category added");
                        new_category.set(String::new());
                        dialog.set(TemplateDialog::None);
                        categories_version.set(*categories_version + 1);
                    }
                    Err(e) => ctx.toasts.failure("Add category failed", &e, "Failed to add category"),
                }
            });
        })
    };

    let on_export = {
        let ctx = ctx.clone();
        let selection = selection.clone();
        let templates = props.templates.clone();
        Callback::from(move |_: MouseEvent| {
            let picked = selection.pick(&templates);
            match ExportService::new().templates_json(&picked, Utc::now()) {
                Ok(file) => {
                    if let Err(e) = download_file(&file) {
                        Logger::error_with_component("template-panel", &format!("Download failed: {:?}", e));
                        ctx.toasts.error("Failed to export templates");
                    } else {
                        ctx.toasts.success(format!("Exported {} templates", picked.len()));
                    }
                }
                Err(e) => ctx.toasts.failure("Template export failed", &e, "Failed to export templates"),
            }
        })
    };

    let on_import = {
        let ctx = ctx.clone();
        let on_changed = props.on_changed.clone();
        let mentor_id = props.mentor_id;
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let ctx = ctx.clone();
            let on_changed = on_changed.clone();
            spawn_local(async move {
                let text = match read_selected_file(&input).await {
                    None => return,
                    Some(Ok(text)) => text,
                    Some(Err(message)) => {
                        Logger::error_with_component("template-panel", &message);
                        ctx.toasts.error("Failed to read file");
                        return;
                    }
                };
                input.set_value("");
                match TemplateService::new(ctx.client.clone()).import(mentor_id, &text).await {
                    Ok(count) => {
                        ctx.toasts.success(format!("Imported {} templates", count));
                        on_changed.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Template import failed", &e, "Failed to import templates"),
                }
            });
        })
    };

    let on_open_shared = {
        let ctx = ctx.clone();
        let shared = shared.clone();
        let dialog = dialog.clone();
        Callback::from(move |_: MouseEvent| {
            let ctx = ctx.clone();
            let shared = shared.clone();
            let dialog = dialog.clone();
            spawn_local(async move {
                match TemplateService::new(ctx.client.clone()).shared_with_me().await {
                    Ok(loaded) => {
                        shared.set(loaded);
                        dialog.set(TemplateDialog::SharedWithMe);
                    }
                    Err(e) => ctx.toasts.failure("Load shared templates failed", &e, "Failed to load shared templates"),
                }
            });
        })
    };

    let on_accept_shared = {
        let ctx = ctx.clone();
        let shared = shared.clone();
        let on_changed = props.on_changed.clone();
        Callback::from(move |shared_id: Uuid| {
            let ctx = ctx.clone();
            let shared = shared.clone();
            let on_changed = on_changed.clone();
            spawn_local(async move {
                let service = TemplateService::new(ctx.client.clone());
                match service.accept_shared(shared_id).await {
                    Ok(()) => {
                        ctx.toasts.success("Template added to your library");
                        if let Ok(loaded) = service.shared_with_me().await {
                            shared.set(loaded);
                        }
                        on_changed.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Accept shared template failed", &e, "Failed to accept template"),
                }
            });
        })
    };

    // Per-template actions

    let on_duplicate = {
        let ctx = ctx.clone();
        let on_changed = props.on_changed.clone();
        let mentor_id = props.mentor_id;
        Callback::from(move |template: ChecklistTemplate| {
            let ctx = ctx.clone();
            let on_changed = on_changed.clone();
            spawn_local(async move {
                match TemplateService::new(ctx.client.clone()).duplicate(mentor_id, &template).await {
                    Ok(copy) => {
                        ctx.toasts.success(format!("Created \"{}\"", copy.name));
                        on_changed.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Duplicate template failed", &e, "Failed to duplicate template"),
                }
            });
        })
    };

    let on_open_versions = {
        let ctx = ctx.clone();
        let versions = versions.clone();
        let dialog = dialog.clone();
        Callback::from(move |template: ChecklistTemplate| {
            let ctx = ctx.clone();
            let versions = versions.clone();
            let dialog = dialog.clone();
            spawn_local(async move {
                match TemplateService::new(ctx.client.clone()).versions(template.id).await {
                    Ok(loaded) => {
                        versions.set(loaded);
                        dialog.set(TemplateDialog::Versions(template));
                    }
                    Err(e) => ctx.toasts.failure("Load versions failed", &e, "Failed to load version history"),
                }
            });
        })
    };

    let on_save_version = {
        let ctx = ctx.clone();
        let versions = versions.clone();
        let mentor_id = props.mentor_id;
        Callback::from(move |template: ChecklistTemplate| {
            let ctx = ctx.clone();
            let versions = versions.clone();
            spawn_local(async move {
                let service = TemplateService::new(ctx.client.clone());
                match service.save_version(mentor_id, &template, &versions).await {
                    Ok(saved) => {
                        ctx.toasts.success(format!("Saved version {}", saved.version));
                        let mut next = (*versions).clone();
                        next.insert(0, saved);
                        versions.set(next);
                    }
                    Err(e) => ctx.toasts.failure("Save version failed", &e, "Failed to save version"),
                }
            });
        })
    };

    let on_restore_version = {
        let ctx = ctx.clone();
        let dialog = dialog.clone();
        let on_changed = props.on_changed.clone();
        Callback::from(move |version: TemplateVersion| {
            let ctx = ctx.clone();
            let dialog = dialog.clone();
            let on_changed = on_changed.clone();
            spawn_local(async move {
                match TemplateService::new(ctx.client.clone()).restore_version(&version).await {
                    Ok(()) => {
                        ctx.toasts.success(format!("Restored version {}", version.version));
                        dialog.set(TemplateDialog::None);
                        on_changed.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Restore version failed", &e, "Failed to restore version"),
                }
            });
        })
    };

    let on_share = {
        let ctx = ctx.clone();
        let share_email = share_email.clone();
        let dialog = dialog.clone();
        Callback::from(move |(e, template_id): (SubmitEvent, Uuid)| {
            e.prevent_default();
            let ctx = ctx.clone();
            let share_email = share_email.clone();
            let dialog = dialog.clone();
            spawn_local(async move {
                match TemplateService::new(ctx.client.clone()).share(template_id, &share_email).await {
                    Ok(()) => {
                        ctx.toasts.success("Template shared");
                        share_email.set(String::new());
                        dialog.set(TemplateDialog::None);
                    }
                    Err(e) => ctx.toasts.failure("Share template failed", &e, "Failed to share template"),
                }
            });
        })
    };

    let on_open_feedback = {
        let ctx = ctx.clone();
        let feedback = feedback.clone();
        let my_rating = my_rating.clone();
        let my_comment = my_comment.clone();
        let dialog = dialog.clone();
        let user_id = props.mentor_id;
        Callback::from(move |template: ChecklistTemplate| {
            let ctx = ctx.clone();
            let feedback = feedback.clone();
            let my_rating = my_rating.clone();
            let my_comment = my_comment.clone();
            let dialog = dialog.clone();
            spawn_local(async move {
                match TemplateService::new(ctx.client.clone()).feedback(template.id).await {
                    Ok(loaded) => {
                        let mine = loaded.get(&user_id);
                        my_rating.set(mine.map(|f| f.rating).unwrap_or(0));
                        my_comment.set(mine.map(|f| f.comment.clone()).unwrap_or_default());
                        feedback.set(loaded);
                        dialog.set(TemplateDialog::Feedback(template));
                    }
                    Err(e) => ctx.toasts.failure("Load template feedback failed", &e, "Failed to load feedback"),
                }
            });
        })
    };

    let on_submit_template_feedback = {
        let ctx = ctx.clone();
        let my_rating = my_rating.clone();
        let my_comment = my_comment.clone();
        let dialog = dialog.clone();
        let user_id = props.mentor_id;
        Callback::from(move |(e, template_id): (SubmitEvent, Uuid)| {
            e.prevent_default();
            let ctx = ctx.clone();
            let dialog = dialog.clone();
            let rating = *my_rating;
            let comment = (*my_comment).clone();
            spawn_local(async move {
                match TemplateService::new(ctx.client.clone())
                    .submit_feedback(template_id, user_id, rating, &comment)
                    .await
                {
                    Ok(()) => {
                        ctx.toasts.success("Feedback saved");
                        dialog.set(TemplateDialog::None);
                    }
                    Err(e) => ctx.toasts.failure("Submit template feedback failed", &e, "Failed to save feedback"),
                }
            });
        })
    };

    let open = |target: TemplateDialog| {
        let dialog = dialog.clone();
        Callback::from(move |_: MouseEvent| dialog.set(target.clone()))
    };

    let usage: HashMap<Uuid, i64> = props
        .stats
        .iter()
        .map(|stat| (stat.template_id, stat.total_uses))
        .collect();
    let all_visible_selected =
        !visible.is_empty() && visible.iter().all(|template| selection.contains(&template.id));
    let direction_label = match filter.direction {
        SortDirection::Asc => "↑",
        SortDirection::Desc => "↓",
    };

    let dialog_view = match (*dialog).clone() {
        TemplateDialog::None => html! {},
        TemplateDialog::NewCategory => html! {
            <Modal title="New Category" on_close={close_dialog.clone()}>
                <form onsubmit={on_add_category}>
                    <input type="text" placeholder="Category name" value={(*new_category).clone()} oninput={bind_input(&new_category)} />
                    <button type="submit" class="primary-button">{ "Add" }</button>
                </form>
            </Modal>
        },
        TemplateDialog::MoveSelected => html! {
            <Modal title={format!("Move {} templates", selection.len())} on_close={close_dialog.clone()}>
                <form onsubmit={on_bulk_move}>
                    <select onchange={bind_select(&move_target)}>
                        <option value="" selected={move_target.is_empty()}>{ "Choose category..." }</option>
                        { for categories.iter().map(|category| html! {
                            <option value={category.clone()} selected={*move_target == *category}>{ category }</option>
                        }) }
                    </select>
                    <button type="submit" class="primary-button">{ "Move" }</button>
                </form>
            </Modal>
        },
        TemplateDialog::Versions(template) => {
            let save = {
                let on_save_version = on_save_version.clone();
                let template = template.clone();
                Callback::from(move |_: MouseEvent| on_save_version.emit(template.clone()))
            };
            html! {
                <Modal title={format!("Versions of {}", template.name)} on_close={close_dialog.clone()}>
                    <button class="primary-button" onclick={save}>{ "Save Current as New Version" }</button>
                    if versions.is_empty() {
                        <p class="empty-state">{ "No versions saved yet" }</p>
                    }
                    <ul class="version-list">
                        { for versions.iter().map(|version| {
                            let on_restore_version = on_restore_version.clone();
                            let restore_target = version.clone();
                            html! {
                                <li key={version.id.to_string()}>
                                    <span>{ format!("v{} · {} · {} items", version.version, version.name, version.items.len()) }</span>
                                    <span class="version-date">{ format_session_date(&version.created_at) }</span>
                                    <button class="secondary-button"
                                            onclick={Callback::from(move |_: MouseEvent| on_restore_version.emit(restore_target.clone()))}>
                                        { "Restore" }
                                    </button>
                                </li>
                            }
                        }) }
                    </ul>
                </Modal>
            }
        }
        TemplateDialog::Share(template) => {
            let template_id = template.id;
            let on_share = on_share.clone();
            html! {
                <Modal title={format!("Share {}", template.name)} on_close={close_dialog.clone()}>
                    <form onsubmit={Callback::from(move |e: SubmitEvent| on_share.emit((e, template_id)))}>
                        <input type="email" placeholder="Recipient e-mail" value={(*share_email).clone()} oninput={bind_input(&share_email)} />
                        <button type="submit" class="primary-button">{ "Share" }</button>
                    </form>
                </Modal>
            }
        }
        TemplateDialog::Feedback(template) => {
            let template_id = template.id;
            let on_submit = on_submit_template_feedback.clone();
            let others: Vec<&TemplateFeedback> = feedback
                .values()
                .filter(|entry| entry.user_id != props.mentor_id)
                .collect();
            html! {
                <Modal title={format!("Feedback for {}", template.name)} on_close={close_dialog.clone()}>
                    <form onsubmit={Callback::from(move |e: SubmitEvent| on_submit.emit((e, template_id)))}>
                        <RatingInput value={*my_rating} on_change={
                            let my_rating = my_rating.clone();
                            Callback::from(move |value: u8| my_rating.set(value))
                        } />
                        <textarea placeholder="Comment" value={(*my_comment).clone()} oninput={bind_textarea(&my_comment)} />
                        <button type="submit" class="primary-button">{ "Save Feedback" }</button>
                    </form>
                    <ul class="feedback-list">
                        { for others.iter().map(|entry| html! {
                            <li>{ format!("{} ★ {}", entry.rating, entry.comment) }</li>
                        }) }
                    </ul>
                </Modal>
            }
        }
        TemplateDialog::SharedWithMe => html! {
            <Modal title="Shared with Me" on_close={close_dialog.clone()}>
                if shared.is_empty() {
                    <p class="empty-state">{ "Nothing has been shared with you yet" }</p>
                }
                <ul class="shared-list">
                    { for shared.iter().map(|entry| {
                        let on_accept_shared = on_accept_shared.clone();
                        let shared_id = entry.id;
                        html! {
                            <li key={entry.id.to_string()}>
                                <span>{ format!("{} from {}", entry.template_name, entry.shared_by_name) }</span>
                                <span class="shared-status">{ &entry.status }</span>
                                if entry.status == "pending" {
                                    <button class="primary-button"
                                            onclick={Callback::from(move |_: MouseEvent| on_accept_shared.emit(shared_id))}>
                                        { "Accept" }
                                    </button>
                                }
                            </li>
                        }
                    }) }
                </ul>
            </Modal>
        },
    };

    html! {
        <section class="template-panel">
            <div class="panel-header">
                <h2>{ "Checklist Templates" }</h2>
                <div class="button-row">
                    <button class="secondary-button" onclick={open(TemplateDialog::NewCategory)}>{ "New Category" }</button>
                    <button class="secondary-button" onclick={on_open_shared}>{ "Shared with Me" }</button>
                    <label class="secondary-button file-button">
                        { "Import" }
                        <input type="file" accept="application/json,.json" onchange={on_import} />
                    </label>
                </div>
            </div>

            <div class="template-toolbar">
                <input type="search" placeholder="Search templates..." value={filter.query.clone()} oninput={on_search} />
                <select onchange={on_category_filter}>
                    <option value="" selected={filter.category.is_none()}>{ "All categories" }</option>
                    { for categories.iter().map(|category| html! {
                        <option value={category.clone()} selected={filter.category.as_deref() == Some(category.as_str())}>{ category }</option>
                    }) }
                </select>
                <select onchange={on_sort_key}>
                    { for [TemplateSortKey::Name, TemplateSortKey::Created, TemplateSortKey::Usage].iter().map(|key| html! {
                        <option value={key.as_str()} selected={filter.sort_key == *key}>{ format!("Sort by {}", key.as_str()) }</option>
                    }) }
                </select>
                <button class="secondary-button" onclick={on_toggle_direction}>{ direction_label }</button>
            </div>

            <div class="bulk-bar">
                <label>
                    <input type="checkbox" checked={all_visible_selected} onchange={on_select_all} />
                    { format!("{} selected", selection.len()) }
                </label>
                <button class="danger-button" disabled={selection.is_empty()} onclick={on_bulk_delete}>{ "Delete" }</button>
                <button class="secondary-button" disabled={selection.is_empty()} onclick={open(TemplateDialog::MoveSelected)}>{ "Move" }</button>
                <button class="secondary-button" disabled={selection.is_empty()} onclick={on_export}>{ "Export" }</button>
            </div>

            if visible.is_empty() {
                <p class="empty-state">{ "No templates match" }</p>
            }
            <div class="template-grid">
                { for visible.iter().map(|template| {
                    let toggle = {
                        let selection = selection.clone();
                        let id = template.id;
                        Callback::from(move |_: Event| {
                            let mut next = (*selection).clone();
                            next.toggle(id);
                            selection.set(next);
                        })
                    };
                    let with_template = |callback: &Callback<ChecklistTemplate>| {
                        let callback = callback.clone();
                        let template = template.clone();
                        Callback::from(move |_: MouseEvent| callback.emit(template.clone()))
                    };
                    html! {
                        <div key={template.id.to_string()} class={classes!("template-card", selection.contains(&template.id).then_some("selected"))}>
                            <div class="template-card-header">
                                <input type="checkbox" checked={selection.contains(&template.id)} onchange={toggle} />
                                <h3>{ &template.name }</h3>
                                if let Some(category) = &template.category {
                                    <span class="category-badge">{ category }</span>
                                }
                            </div>
                            <ul class="template-items">
                                { for template.items.iter().map(|item| html! { <li>{ item }</li> }) }
                            </ul>
                            <div class="template-meta">
                                { format!("Used {} times", usage.get(&template.id).copied().unwrap_or(0)) }
                            </div>
                            <div class="button-row">
                                <button class="secondary-button" onclick={with_template(&on_duplicate)}>{ "Duplicate" }</button>
                                <button class="secondary-button" onclick={with_template(&on_open_versions)}>{ "Versions" }</button>
                                <button class="secondary-button" onclick={open(TemplateDialog::Share(template.clone()))}>{ "Share" }</button>
                                <button class="secondary-button" onclick={with_template(&on_open_feedback)}>{ "Feedback" }</button>
                            </div>
                        </div>
                    }
                }) }
            </div>
            { dialog_view }
        </section>
    }
}
