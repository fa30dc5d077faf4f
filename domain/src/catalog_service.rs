//! Services offered by mentors: list, create, edit and delete.

use chrono::{DateTime, Utc};
use log::info;
use shared::{NewService, Service, ServiceDraft, ServiceUpdate};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::gateway::{fetch_all, insert_one, tables, to_row, DataGateway, Filter, Query};

const SERVICE_COLUMNS: &str = "*, profiles(full_name)";

pub struct CatalogService<G: DataGateway + ?Sized> {
    gateway: Rc<G>,
}

impl<G: DataGateway + ?Sized> CatalogService<G> {
    pub fn new(gateway: Rc<G>) -> Self {
        Self { gateway }
    }

    /// Every service with its owner's name, newest first
    pub async fn list(&self) -> ServiceResult<Vec<Service>> {
        let query = Query::from(tables::SERVICES)
            .select(SERVICE_COLUMNS)
            .order("created_at", false);
        Ok(fetch_all(self.gateway.as_ref(), &query).await?)
    }

    pub async fn create(&self, owner: Uuid, draft: &ServiceDraft) -> ServiceResult<Service> {
        let title = validate(draft)?;
        let record = NewService {
            title,
            description: draft.description.trim().to_string(),
            mentor_id: owner,
        };
        let service: Service = insert_one(self.gateway.as_ref(), tables::SERVICES, &record).await?;
        info!("🛠️ CATALOG: Created service {} ({})", service.id, service.title);
        Ok(service)
    }

    pub async fn update(
        &self,
        service_id: Uuid,
        draft: &ServiceDraft,
        now: DateTime<Utc>,
    ) -> ServiceResult<()> {
        let title = validate(draft)?;
        let patch = ServiceUpdate {
            title,
            description: draft.description.trim().to_string(),
            updated_at: now,
        };
        let updated = self
            .gateway
            .update(tables::SERVICES, to_row(&patch)?, &[Filter::eq("id", service_id)])
            .await?;
        if updated.is_empty() {
            return Err(ServiceError::NotFound("Service not found".to_string()));
        }
        info!("🛠️ CATALOG: Updated service {}", service_id);
        Ok(())
    }

    pub async fn delete(&self, service_id: Uuid) -> ServiceResult<()> {
        self.gateway
            .delete(tables::SERVICES, &[Filter::eq("id", service_id)])
            .await?;
        info!("🛠️ CATALOG: Deleted service {}", service_id);
        Ok(())
    }
}

fn validate(draft: &ServiceDraft) -> ServiceResult<String> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(ServiceError::Validation("Title is required".to_string()));
    }
    Ok(title.to_string())
}
