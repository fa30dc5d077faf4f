//! Checklist template management.
//!
//! Covers the in-memory filter/sort/selection logic of the template panel and
//! the backend operations behind it: CRUD, categories, bulk actions, version
//! history, import, sharing and per-user feedback.

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;
use shared::{
    ChecklistItem, ChecklistTemplate, NewTemplate, NewTemplateCategory, NewTemplateVersion,
    SharedTemplate, TemplateCategory, TemplateFeedback, TemplateFeedbackInput, TemplateStats,
    TemplateVersion,
};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::export_service::ExportService;
use crate::gateway::{
    call, fetch_all, fetch_one, insert_one, tables, to_row, DataGateway, Filter, Procedure, Query,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateSortKey {
    #[default]
    Name,
    Created,
    Usage,
}

impl TemplateSortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateSortKey::Name => "name",
            TemplateSortKey::Created => "created",
            TemplateSortKey::Usage => "usage",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "created" => TemplateSortKey::Created,
            "usage" => TemplateSortKey::Usage,
            _ => TemplateSortKey::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Search, category and ordering chosen in the template panel
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateFilter {
    pub query: String,
    /// `None` shows every category
    pub category: Option<String>,
    pub sort_key: TemplateSortKey,
    pub direction: SortDirection,
}

impl TemplateFilter {
    pub fn matches(&self, template: &ChecklistTemplate) -> bool {
        let needle = self.query.to_lowercase();
        let matches_search = template.name.to_lowercase().contains(&needle)
            || template
                .items
                .iter()
                .any(|item| item.to_lowercase().contains(&needle));
        let matches_category = match &self.category {
            None => true,
            Some(category) => template.category.as_deref() == Some(category.as_str()),
        };
        matches_search && matches_category
    }

    /// Filtered then sorted copy; usage falls back to 0 without statistics
    pub fn apply(
        &self,
        templates: &[ChecklistTemplate],
        stats: &[TemplateStats],
    ) -> Vec<ChecklistTemplate> {
        let usage: HashMap<Uuid, i64> = stats
            .iter()
            .map(|stat| (stat.template_id, stat.total_uses))
            .collect();
        let uses = |template: &ChecklistTemplate| usage.get(&template.id).copied().unwrap_or(0);

        let mut visible: Vec<ChecklistTemplate> = templates
            .iter()
            .filter(|template| self.matches(template))
            .cloned()
            .collect();

        visible.sort_by(|a, b| {
            let ordering = match self.sort_key {
                TemplateSortKey::Name => compare_names(&a.name, &b.name),
                TemplateSortKey::Created => a.created_at.cmp(&b.created_at),
                TemplateSortKey::Usage => uses(a).cmp(&uses(b)),
            };
            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        visible
    }
}

/// Case-insensitive comparison with the raw text as tie-breaker
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Ids of the templates ticked in the panel
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateSelection {
    ids: HashSet<Uuid>,
}

impl TemplateSelection {
    pub fn toggle(&mut self, id: Uuid) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Select every visible template, or clear when they are all selected already
    pub fn toggle_all(&mut self, visible: &[ChecklistTemplate]) {
        let all_selected =
            !visible.is_empty() && visible.iter().all(|template| self.ids.contains(&template.id));
        if all_selected {
            self.ids.clear();
        } else {
            self.ids = visible.iter().map(|template| template.id).collect();
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.ids.iter().copied().collect();
        ids.sort();
        ids
    }

    /// Selected templates in list order
    pub fn pick(&self, templates: &[ChecklistTemplate]) -> Vec<ChecklistTemplate> {
        templates
            .iter()
            .filter(|template| self.ids.contains(&template.id))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    Delete,
    MoveTo(String),
}

#[derive(Deserialize)]
struct ProfileId {
    id: Uuid,
}

pub struct TemplateService<G: DataGateway + ?Sized> {
    gateway: Rc<G>,
}

impl<G: DataGateway + ?Sized> TemplateService<G> {
    pub fn new(gateway: Rc<G>) -> Self {
        Self { gateway }
    }

    /// The mentor's templates, newest first
    pub async fn list(&self, mentor_id: Uuid) -> ServiceResult<Vec<ChecklistTemplate>> {
        let query = Query::from(tables::CHECKLIST_TEMPLATES)
            .eq("mentor_id", mentor_id)
            .order("created_at", false);
        let templates: Vec<ChecklistTemplate> = fetch_all(self.gateway.as_ref(), &query).await?;
        debug!("🧩 TEMPLATES: Loaded {} templates", templates.len());
        Ok(templates)
    }

    async fn create(&self, template: NewTemplate) -> ServiceResult<ChecklistTemplate> {
        info!("🧩 TEMPLATES: Creating template '{}'", template.name);
        Ok(insert_one(self.gateway.as_ref(), tables::CHECKLIST_TEMPLATES, &template).await?)
    }

    /// Save a session's checklist as a new template
    pub async fn create_from_checklist(
        &self,
        mentor_id: Uuid,
        name: &str,
        checklist: &[ChecklistItem],
        category: Option<String>,
    ) -> ServiceResult<ChecklistTemplate> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("Template name is required".to_string()));
        }
        self.create(NewTemplate {
            mentor_id,
            name: name.to_string(),
            items: checklist.iter().map(|item| item.content.clone()).collect(),
            category,
        })
        .await
    }

    pub async fn duplicate(
        &self,
        mentor_id: Uuid,
        template: &ChecklistTemplate,
    ) -> ServiceResult<ChecklistTemplate> {
        self.create(NewTemplate {
            mentor_id,
            name: format!("{} (Copy)", template.name),
            items: template.items.clone(),
            category: template.category.clone(),
        })
        .await
    }

    /// Category names, alphabetical
    pub async fn categories(&self, mentor_id: Uuid) -> ServiceResult<Vec<String>> {
        let query = Query::from(tables::TEMPLATE_CATEGORIES)
            .select("name")
            .eq("mentor_id", mentor_id)
            .order("name", true);
        let categories: Vec<TemplateCategory> = fetch_all(self.gateway.as_ref(), &query).await?;
        Ok(categories.into_iter().map(|category| category.name).collect())
    }

    pub async fn add_category(&self, mentor_id: Uuid, name: &str) -> ServiceResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("Category name is required".to_string()));
        }
        let category = NewTemplateCategory {
            mentor_id,
            name: name.to_string(),
        };
        self.gateway
            .insert(tables::TEMPLATE_CATEGORIES, to_row(&category)?)
            .await?;
        Ok(())
    }

    pub async fn bulk(&self, operation: &BulkOperation, ids: &[Uuid]) -> ServiceResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let filters = [Filter::in_list("id", ids)];
        match operation {
            BulkOperation::Delete => {
                info!("🧩 TEMPLATES: Deleting {} templates", ids.len());
                self.gateway
                    .delete(tables::CHECKLIST_TEMPLATES, &filters)
                    .await?;
            }
            BulkOperation::MoveTo(category) => {
                info!("🧩 TEMPLATES: Moving {} templates to '{}'", ids.len(), category);
                self.gateway
                    .update(
                        tables::CHECKLIST_TEMPLATES,
                        json!({ "category": category }),
                        &filters,
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// Version history of a template, newest first
    pub async fn versions(&self, template_id: Uuid) -> ServiceResult<Vec<TemplateVersion>> {
        let query = Query::from(tables::TEMPLATE_VERSIONS)
            .eq("template_id", template_id)
            .order("version", false);
        Ok(fetch_all(self.gateway.as_ref(), &query).await?)
    }

    /// Snapshot the template as the next version (newest + 1, or 1)
    pub async fn save_version(
        &self,
        author: Uuid,
        template: &ChecklistTemplate,
        history: &[TemplateVersion],
    ) -> ServiceResult<TemplateVersion> {
        let version = next_version_number(history);
        info!(
            "🧩 TEMPLATES: Saving version {} of '{}'",
            version, template.name
        );
        let row = NewTemplateVersion {
            template_id: template.id,
            version,
            name: template.name.clone(),
            items: template.items.clone(),
            category: template.category.clone(),
            created_by: author,
        };
        Ok(insert_one(self.gateway.as_ref(), tables::TEMPLATE_VERSIONS, &row).await?)
    }

    /// Copy a version's name, items and category back onto its template
    pub async fn restore_version(&self, version: &TemplateVersion) -> ServiceResult<()> {
        info!(
            "🧩 TEMPLATES: Restoring version {} of {}",
            version.version, version.template_id
        );
        self.gateway
            .update(
                tables::CHECKLIST_TEMPLATES,
                json!({
                    "name": version.name,
                    "items": version.items,
                    "category": version.category,
                }),
                &[Filter::eq("id", version.template_id)],
            )
            .await?;
        Ok(())
    }

    /// Insert every template of an export file, returning how many were added
    pub async fn import(&self, mentor_id: Uuid, text: &str) -> ServiceResult<usize> {
        let imported = ExportService::new().parse_template_import(text)?;
        if imported.is_empty() {
            return Ok(0);
        }
        let rows: Vec<NewTemplate> = imported
            .into_iter()
            .map(|template| NewTemplate {
                mentor_id,
                name: template.name,
                items: template.items,
                category: template.category,
            })
            .collect();
        let count = rows.len();
        self.gateway
            .insert(tables::CHECKLIST_TEMPLATES, to_row(&rows)?)
            .await?;
        info!("🧩 TEMPLATES: Imported {} templates", count);
        Ok(count)
    }

    pub async fn shared_with_me(&self) -> ServiceResult<Vec<SharedTemplate>> {
        let shared: Option<Vec<SharedTemplate>> =
            call(self.gateway.as_ref(), Procedure::GetSharedTemplates, json!({})).await?;
        Ok(shared.unwrap_or_default())
    }

    /// Share a template with the user registered under `email`
    pub async fn share(&self, template_id: Uuid, email: &str) -> ServiceResult<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ServiceError::Validation("Please enter an email address".to_string()));
        }
        let query = Query::from(tables::PROFILES).select("id").eq("email", email);
        let recipient: ProfileId = match fetch_one(self.gateway.as_ref(), &query).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!("🧩 TEMPLATES: Share recipient lookup failed: {}", err);
                return Err(ServiceError::NotFound("User not found".to_string()));
            }
        };

        self.gateway
            .rpc(
                Procedure::ShareTemplate,
                json!({ "p_template_id": template_id, "p_shared_with": recipient.id }),
            )
            .await?;
        info!("🧩 TEMPLATES: Shared {} with {}", template_id, recipient.id);
        Ok(())
    }

    pub async fn accept_shared(&self, shared_template_id: Uuid) -> ServiceResult<()> {
        self.gateway
            .rpc(
                Procedure::AcceptSharedTemplate,
                json!({ "p_shared_template_id": shared_template_id }),
            )
            .await?;
        Ok(())
    }

    /// Feedback on a template keyed by the author's user id
    pub async fn feedback(&self, template_id: Uuid) -> ServiceResult<HashMap<Uuid, TemplateFeedback>> {
        let query = Query::from(tables::TEMPLATE_FEEDBACK).eq("template_id", template_id);
        let rows: Vec<TemplateFeedback> = fetch_all(self.gateway.as_ref(), &query).await?;
        Ok(rows.into_iter().map(|row| (row.user_id, row)).collect())
    }

    pub async fn submit_feedback(
        &self,
        template_id: Uuid,
        user_id: Uuid,
        rating: u8,
        comment: &str,
    ) -> ServiceResult<()> {
        if !(1..=5).contains(&rating) {
            return Err(ServiceError::Validation("Rating must be between 1 and 5".to_string()));
        }
        let input = TemplateFeedbackInput {
            template_id,
            user_id,
            rating,
            comment: comment.trim().to_string(),
        };
        self.gateway
            .upsert(
                tables::TEMPLATE_FEEDBACK,
                to_row(&input)?,
                Some("template_id,user_id"),
            )
            .await?;
        Ok(())
    }
}

pub fn next_version_number(history: &[TemplateVersion]) -> u32 {
    history
        .iter()
        .map(|version| version.version)
        .max()
        .map(|newest| newest + 1)
        .unwrap_or(1)
}
