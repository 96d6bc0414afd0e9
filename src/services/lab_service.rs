use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::database::entities::{labs, projects, researchers};
use crate::errors::{CoreError, CoreResult};
use crate::services::associations;
use crate::services::graph_consistency::{self, require_lab, require_researcher};
use crate::services::pagination::{paginate, Page, PageParams};
use crate::services::validation::{deserialize_some, ValidationService};
use crate::services::views::{LabView, ProjectRef, ResearcherRef};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewLab {
    pub name: Option<String>,
    pub description: Option<String>,
    pub principal_investigator_id: Option<i32>,
    pub project_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub principal_investigator_id: Option<Option<i32>>,
    /// Replaces the whole set of associated projects
    pub project_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabDetail {
    #[serde(flatten)]
    pub lab: LabView,
    pub principal_investigator: Option<ResearcherRef>,
    pub members: Vec<ResearcherRef>,
    pub projects: Vec<ProjectRef>,
}

#[derive(Clone)]
pub struct LabService {
    db: DatabaseConnection,
}

impl LabService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: NewLab) -> CoreResult<LabDetail> {
        let name = ValidationService::required_text("name", input.name.as_deref(), 100)?;
        let description =
            ValidationService::optional_text("description", input.description.as_deref(), 5000)?;

        let txn = self.db.begin().await?;
        ensure_name_available(&txn, &name, None).await?;
        if let Some(pi_id) = input.principal_investigator_id {
            require_researcher(&txn, pi_id).await?;
        }

        let lab = labs::ActiveModel {
            name: Set(name),
            description: Set(description),
            principal_investigator_id: Set(input.principal_investigator_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let Some(project_ids) = input.project_ids.as_deref() {
            graph_consistency::replace_lab_projects(&txn, lab.id, project_ids).await?;
        }
        txn.commit().await?;

        info!("Created lab {} ({})", lab.id, lab.name);
        load_detail(&self.db, lab.id).await
    }

    pub async fn list(&self, params: PageParams) -> CoreResult<Page<LabView>> {
        let page = paginate(&self.db, labs::Entity::find(), labs::Column::Id, params).await?;
        Ok(page.map(LabView::from))
    }

    pub async fn get(&self, id: i32) -> CoreResult<LabDetail> {
        load_detail(&self.db, id).await
    }

    pub async fn update(&self, id: i32, input: LabUpdate) -> CoreResult<LabDetail> {
        let txn = self.db.begin().await?;
        let existing = require_lab(&txn, id).await?;
        let mut active: labs::ActiveModel = existing.into();

        if let Some(name) = input.name.as_deref() {
            let name = ValidationService::required_text("name", Some(name), 100)?;
            ensure_name_available(&txn, &name, Some(id)).await?;
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(ValidationService::optional_text(
                "description",
                description.as_deref(),
                5000,
            )?);
        }
        if let Some(pi_id) = input.principal_investigator_id {
            if let Some(pi_id) = pi_id {
                require_researcher(&txn, pi_id).await?;
            }
            active.principal_investigator_id = Set(pi_id);
        }

        if active.is_changed() {
            active.update(&txn).await?;
        }
        if let Some(project_ids) = input.project_ids.as_deref() {
            graph_consistency::replace_lab_projects(&txn, id, project_ids).await?;
        }
        txn.commit().await?;

        load_detail(&self.db, id).await
    }

    pub async fn delete(&self, id: i32) -> CoreResult<()> {
        let txn = self.db.begin().await?;
        graph_consistency::delete_lab(&txn, id).await?;
        txn.commit().await?;
        info!("Deleted lab {}", id);
        Ok(())
    }
}

async fn ensure_name_available<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    exclude_id: Option<i32>,
) -> CoreResult<()> {
    let mut query = labs::Entity::find().filter(labs::Column::Name.eq(name));
    if let Some(id) = exclude_id {
        query = query.filter(labs::Column::Id.ne(id));
    }
    if query.one(conn).await?.is_some() {
        return Err(
            CoreError::conflict(format!("A lab named '{}' already exists", name))
                .with_field("field", "name"),
        );
    }
    Ok(())
}

pub async fn load_detail<C: ConnectionTrait>(conn: &C, id: i32) -> CoreResult<LabDetail> {
    let lab = require_lab(conn, id).await?;

    let principal_investigator = match lab.principal_investigator_id {
        Some(pi_id) => researchers::Entity::find_by_id(pi_id)
            .one(conn)
            .await?
            .as_ref()
            .map(ResearcherRef::from),
        None => None,
    };
    let members = researchers::Entity::find()
        .filter(researchers::Column::LabId.eq(id))
        .order_by_asc(researchers::Column::Id)
        .all(conn)
        .await?;
    let project_ids = associations::project_ids_of_lab(conn, id).await?;
    let projects = projects::Entity::find()
        .filter(projects::Column::Id.is_in(project_ids))
        .order_by_asc(projects::Column::Id)
        .all(conn)
        .await?;

    Ok(LabDetail {
        lab: lab.into(),
        principal_investigator,
        members: members.iter().map(ResearcherRef::from).collect(),
        projects: projects.iter().map(ProjectRef::from).collect(),
    })
}
