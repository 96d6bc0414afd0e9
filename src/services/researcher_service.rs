use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::database::entities::{grants, labs, notes, projects, researchers};
use crate::errors::{CoreError, CoreResult};
use crate::services::associations;
use crate::services::graph_consistency::{self, require_lab, require_researcher};
use crate::services::pagination::{paginate, Page, PageParams};
use crate::services::validation::{deserialize_some, ValidationService};
use crate::services::views::{GrantRef, LabRef, NoteView, ProjectRef, ResearcherView};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewResearcher {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    #[serde(alias = "lab_id")]
    pub lab_id: Option<i32>,
}

/// Partial update: absent fields are left unchanged, `null` clears a nullable field.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearcherUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub bio: Option<Option<String>>,
    #[serde(default, alias = "lab_id", deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub lab_id: Option<Option<i32>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearcherDetail {
    #[serde(flatten)]
    pub researcher: ResearcherView,
    pub lab: Option<LabRef>,
    pub led_labs: Vec<LabRef>,
    pub led_projects: Vec<ProjectRef>,
    pub led_grants: Vec<GrantRef>,
    pub co_pi_grants: Vec<GrantRef>,
    pub notes: Vec<NoteView>,
}

#[derive(Clone)]
pub struct ResearcherService {
    db: DatabaseConnection,
}

impl ResearcherService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: NewResearcher) -> CoreResult<ResearcherDetail> {
        let name = ValidationService::required_text("name", input.name.as_deref(), 100)?;
        let email = ValidationService::email(input.email.as_deref())?;
        let department =
            ValidationService::required_text("department", input.department.as_deref(), 120)?;
        let bio = ValidationService::optional_text("bio", input.bio.as_deref(), 5000)?;

        let txn = self.db.begin().await?;
        ensure_email_available(&txn, &email, None).await?;
        if let Some(lab_id) = input.lab_id {
            require_lab(&txn, lab_id).await?;
        }

        let researcher = researchers::ActiveModel {
            name: Set(name),
            email: Set(email),
            department: Set(department),
            bio: Set(bio),
            lab_id: Set(input.lab_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!("Created researcher {} ({})", researcher.id, researcher.email);
        load_detail(&self.db, researcher.id).await
    }

    pub async fn list(&self, params: PageParams) -> CoreResult<Page<ResearcherView>> {
        let page = paginate(
            &self.db,
            researchers::Entity::find(),
            researchers::Column::Id,
            params,
        )
        .await?;
        Ok(page.map(ResearcherView::from))
    }

    pub async fn get(&self, id: i32) -> CoreResult<ResearcherDetail> {
        load_detail(&self.db, id).await
    }

    pub async fn update(&self, id: i32, input: ResearcherUpdate) -> CoreResult<ResearcherDetail> {
        let txn = self.db.begin().await?;
        let existing = require_researcher(&txn, id).await?;
        let mut active: researchers::ActiveModel = existing.into();

        if let Some(name) = input.name.as_deref() {
            active.name = Set(ValidationService::required_text("name", Some(name), 100)?);
        }
        if let Some(email) = input.email.as_deref() {
            let email = ValidationService::email(Some(email))?;
            ensure_email_available(&txn, &email, Some(id)).await?;
            active.email = Set(email);
        }
        if let Some(department) = input.department.as_deref() {
            active.department = Set(ValidationService::required_text(
                "department",
                Some(department),
                120,
            )?);
        }
        if let Some(bio) = input.bio {
            active.bio = Set(ValidationService::optional_text("bio", bio.as_deref(), 5000)?);
        }
        if let Some(lab_id) = input.lab_id {
            if let Some(lab_id) = lab_id {
                require_lab(&txn, lab_id).await?;
            }
            active.lab_id = Set(lab_id);
        }

        if active.is_changed() {
            active.update(&txn).await?;
        }
        txn.commit().await?;

        load_detail(&self.db, id).await
    }

    pub async fn delete(&self, id: i32) -> CoreResult<()> {
        let txn = self.db.begin().await?;
        graph_consistency::delete_researcher(&txn, id).await?;
        txn.commit().await?;
        info!("Deleted researcher {}", id);
        Ok(())
    }
}

async fn ensure_email_available<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    exclude_id: Option<i32>,
) -> CoreResult<()> {
    let mut query = researchers::Entity::find().filter(researchers::Column::Email.eq(email));
    if let Some(id) = exclude_id {
        query = query.filter(researchers::Column::Id.ne(id));
    }
    if query.one(conn).await?.is_some() {
        return Err(CoreError::conflict(format!(
            "A researcher with email '{}' already exists",
            email
        ))
        .with_field("field", "email"));
    }
    Ok(())
}

pub async fn load_detail<C: ConnectionTrait>(conn: &C, id: i32) -> CoreResult<ResearcherDetail> {
    let researcher = require_researcher(conn, id).await?;

    let lab = match researcher.lab_id {
        Some(lab_id) => labs::Entity::find_by_id(lab_id)
            .one(conn)
            .await?
            .as_ref()
            .map(LabRef::from),
        None => None,
    };

    let led_labs = labs::Entity::find()
        .filter(labs::Column::PrincipalInvestigatorId.eq(id))
        .order_by_asc(labs::Column::Id)
        .all(conn)
        .await?;
    let led_projects = projects::Entity::find()
        .filter(projects::Column::PiId.eq(id))
        .order_by_asc(projects::Column::Id)
        .all(conn)
        .await?;
    let led_grants = grants::Entity::find()
        .filter(grants::Column::PiId.eq(id))
        .order_by_asc(grants::Column::Id)
        .all(conn)
        .await?;
    let co_pi_grant_ids = associations::co_pi_grant_ids_of_researcher(conn, id).await?;
    let co_pi_grants = grants::Entity::find()
        .filter(grants::Column::Id.is_in(co_pi_grant_ids))
        .order_by_asc(grants::Column::Id)
        .all(conn)
        .await?;
    let notes = notes::Entity::find()
        .filter(notes::Column::ResearcherId.eq(id))
        .order_by_asc(notes::Column::Id)
        .all(conn)
        .await?;

    Ok(ResearcherDetail {
        researcher: researcher.into(),
        lab,
        led_labs: led_labs.iter().map(LabRef::from).collect(),
        led_projects: led_projects.iter().map(ProjectRef::from).collect(),
        led_grants: led_grants.iter().map(GrantRef::from).collect(),
        co_pi_grants: co_pi_grants.iter().map(GrantRef::from).collect(),
        notes: notes.into_iter().map(NoteView::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::errors::CoreErrorKind;

    fn ada() -> NewResearcher {
        NewResearcher {
            name: Some("Ada Lovelace".into()),
            email: Some("ada@lab.edu".into()),
            department: Some("Mathematics".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let service = ResearcherService::new(setup_test_db().await.unwrap());
        let created = service.create(ada()).await.unwrap();
        assert_eq!(created.researcher.name, "Ada Lovelace");
        assert!(created.lab.is_none());

        let fetched = service.get(created.researcher.id).await.unwrap();
        assert_eq!(fetched.researcher.email, "ada@lab.edu");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let service = ResearcherService::new(setup_test_db().await.unwrap());
        service.create(ada()).await.unwrap();
        let err = service.create(ada()).await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Conflict);
    }

    #[tokio::test]
    async fn missing_department_is_rejected() {
        let service = ResearcherService::new(setup_test_db().await.unwrap());
        let mut input = ada();
        input.department = None;
        let err = service.create(input).await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);
    }

    #[tokio::test]
    async fn unknown_lab_is_not_found() {
        let service = ResearcherService::new(setup_test_db().await.unwrap());
        let mut input = ada();
        input.lab_id = Some(42);
        let err = service.create(input).await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
        assert_eq!(service.list(PageParams::default()).await.unwrap().total_items, 0);
    }

    #[tokio::test]
    async fn partial_update_clears_bio_only() {
        let service = ResearcherService::new(setup_test_db().await.unwrap());
        let mut input = ada();
        input.bio = Some("Analyst".into());
        let created = service.create(input).await.unwrap();

        let patch: ResearcherUpdate = serde_json::from_str(r#"{"bio": null}"#).unwrap();
        let updated = service.update(created.researcher.id, patch).await.unwrap();
        assert_eq!(updated.researcher.bio, None);
        assert_eq!(updated.researcher.name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn list_is_paginated() {
        let service = ResearcherService::new(setup_test_db().await.unwrap());
        for i in 0..3 {
            let mut input = ada();
            input.email = Some(format!("r{}@lab.edu", i));
            service.create(input).await.unwrap();
        }
        let page = service
            .list(PageParams {
                page: Some(2),
                per_page: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.items.len(), 1);
    }
}
