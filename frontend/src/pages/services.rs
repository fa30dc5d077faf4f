use chrono::Utc;
use mentor_match_domain::catalog_service::CatalogService;
use shared::{Service, ServiceDraft};
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::components::form_fields::{bind_input, bind_textarea, Spinner};
use crate::components::modal::Modal;
use crate::context::AppContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceEditor {
    Closed,
    Creating,
    Editing(Uuid),
}

#[function_component(ServicesPage)]
pub fn services_page() -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };

    let services = use_state(Vec::<Service>::new);
    let loading = use_state(|| true);
    let reload_counter = use_state(|| 0u32);
    let editor = use_state(|| ServiceEditor::Closed);
    let title = use_state(String::new);
    let description = use_state(String::new);

    {
        let client = ctx.client.clone();
        let toasts = ctx.toasts.clone();
        let services = services.clone();
        let loading = loading.clone();
        use_effect_with(*reload_counter, move |_| {
            spawn_local(async move {
                match CatalogService::new(client).list().await {
                    Ok(loaded) => services.set(loaded),
                    Err(e) => toasts.failure("Load services failed", &e, "Failed to load services"),
                }
                loading.set(false);
            });
            || ()
        });
    }

    let reload = {
        let reload_counter = reload_counter.clone();
        Callback::from(move |_: ()| reload_counter.set(*reload_counter + 1))
    };

    let on_add = {
        let editor = editor.clone();
        let title = title.clone();
        let description = description.clone();
        Callback::from(move |_: MouseEvent| {
            title.set(String::new());
            description.set(String::new());
            editor.set(ServiceEditor::Creating);
        })
    };

    let on_edit = {
        let editor = editor.clone();
        let title = title.clone();
        let description = description.clone();
        Callback::from(move |service: Service| {
            title.set(service.title.clone());
            description.set(service.description.clone().unwrap_or_default());
            editor.set(ServiceEditor::Editing(service.id));
        })
    };

    let on_close = {
        let editor = editor.clone();
        Callback::from(move |_: ()| editor.set(ServiceEditor::Closed))
    };

    let on_submit = {
        let ctx = ctx.clone();
        let editor = editor.clone();
        let reload = reload.clone();
        let draft = ServiceDraft {
            title: (*title).clone(),
            description: (*description).clone(),
        };
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let ctx = ctx.clone();
            let editor = editor.clone();
            let reload = reload.clone();
            let draft = draft.clone();
            let mode = *editor;
            spawn_local(async move {
                let service = CatalogService::new(ctx.client.clone());
                let result = match (mode, ctx.auth.user_id()) {
                    (ServiceEditor::Editing(id), _) => service
                        .update(id, &draft, Utc::now())
                        .await
                        .map(|_| "Service updated successfully"),
                    (ServiceEditor::Creating, Some(owner)) => service
                        .create(owner, &draft)
                        .await
                        .map(|_| "Service created successfully"),
                    (ServiceEditor::Creating, None) => {
                        ctx.toasts.error("Please sign in to add a service");
                        return;
                    }
                    (ServiceEditor::Closed, _) => return,
                };
                match result {
                    Ok(message) => {
                        ctx.toasts.success(message);
                        editor.set(ServiceEditor::Closed);
                        reload.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Save service failed", &e, "Failed to save service"),
                }
            });
        })
    };

    let on_delete = {
        let ctx = ctx.clone();
        let reload = reload.clone();
        Callback::from(move |id: Uuid| {
            let ctx = ctx.clone();
            let reload = reload.clone();
            spawn_local(async move {
                match CatalogService::new(ctx.client.clone()).delete(id).await {
                    Ok(()) => {
                        ctx.toasts.success("Service deleted successfully");
                        reload.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Delete service failed", &e, "Failed to delete service"),
                }
            });
        })
    };

    if *loading {
        return html! { <Spinner /> };
    }

    let modal = match *editor {
        ServiceEditor::Closed => html! {},
        mode => {
            let (heading, submit) = if mode == ServiceEditor::Creating {
                ("Add Service", "Create")
            } else {
                ("Edit Service", "Update")
            };
            html! {
                <Modal title={heading} on_close={on_close}>
                    <form onsubmit={on_submit}>
                        <label>{ "Title" }</label>
                        <input type="text" required=true value={(*title).clone()} oninput={bind_input(&title)} />
                        <label>{ "Description" }</label>
                        <textarea rows="3" value={(*description).clone()} oninput={bind_textarea(&description)} />
                        <div class="button-row">
                            <button type="button" class="secondary-button"
                                    onclick={{
                                        let editor = editor.clone();
                                        Callback::from(move |_: MouseEvent| editor.set(ServiceEditor::Closed))
                                    }}>
                                { "Cancel" }
                            </button>
                            <button type="submit" class="primary-button">{ submit }</button>
                        </div>
                    </form>
                </Modal>
            }
        }
    };

    html! {
        <div class="services-page">
            <div class="page-header">
                <h1>{ "Services" }</h1>
                <button class="primary-button" onclick={on_add}>{ "+ Add Service" }</button>
            </div>
            if services.is_empty() {
                <p class="empty-state">{ "No services yet" }</p>
            }
            <div class="service-grid">
                { for services.iter().map(|service| {
                    let edit = {
                        let on_edit = on_edit.clone();
                        let service = service.clone();
                        Callback::from(move |_: MouseEvent| on_edit.emit(service.clone()))
                    };
                    let delete = {
                        let on_delete = on_delete.clone();
                        let id = service.id;
                        Callback::from(move |_: MouseEvent| on_delete.emit(id))
                    };
                    let owner = service
                        .profiles
                        .as_ref()
                        .map(|profile| profile.name_or("Unknown mentor").to_string())
                        .unwrap_or_else(|| "Unknown mentor".to_string());
                    html! {
                        <div key={service.id.to_string()} class="service-card">
                            <h3>{ &service.title }</h3>
                            <p>{ service.description.clone().unwrap_or_default() }</p>
                            <p class="service-owner">{ format!("By: {}", owner) }</p>
                            <div class="button-row">
                                <button class="secondary-button" onclick={edit}>{ "Edit" }</button>
                                <button class="danger-button" onclick={delete}>{ "Delete" }</button>
                            </div>
                        </div>
                    }
                }) }
            </div>
            { modal }
        </div>
    }
}
