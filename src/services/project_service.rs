use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::database::entities::{compute_resources, grants, labs, notes, projects, researchers};
use crate::errors::CoreResult;
use crate::services::associations;
use crate::services::graph_consistency::{
    self, require_project, require_researcher, resolve_pi_change,
};
use crate::services::pagination::{paginate, Page, PageParams};
use crate::services::validation::{deserialize_some, ValidationService};
use crate::services::views::{
    ComputeResourceRef, GrantRef, LabRef, NoteView, ProjectView, ResearcherRef,
};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub lead_researcher_id: Option<i32>,
    pub lab_ids: Option<Vec<i32>>,
    pub compute_resource_ids: Option<Vec<i32>>,
    pub grant_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub end_date: Option<Option<String>>,
    /// Must name an existing researcher; `null` is rejected
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub lead_researcher_id: Option<Option<i32>>,
    pub lab_ids: Option<Vec<i32>>,
    pub compute_resource_ids: Option<Vec<i32>>,
    pub grant_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: ProjectView,
    pub lead_researcher: Option<ResearcherRef>,
    pub labs: Vec<LabRef>,
    pub compute_resources: Vec<ComputeResourceRef>,
    pub grants: Vec<GrantRef>,
    pub notes: Vec<NoteView>,
}

#[derive(Clone)]
pub struct ProjectService {
    db: DatabaseConnection,
}

impl ProjectService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: NewProject) -> CoreResult<ProjectDetail> {
        let name = ValidationService::required_text("name", input.name.as_deref(), 200)?;
        let description =
            ValidationService::optional_text("description", input.description.as_deref(), 10_000)?;
        let start_date = ValidationService::required_date("startDate", input.start_date.as_deref())?;
        let end_date = ValidationService::optional_date("endDate", input.end_date.as_deref())?;
        ValidationService::date_order(Some(start_date), end_date, "endDate")?;
        let pi_id = ValidationService::required_id("leadResearcherId", input.lead_researcher_id)?;

        let txn = self.db.begin().await?;
        require_researcher(&txn, pi_id).await?;

        let project = projects::ActiveModel {
            name: Set(name),
            description: Set(description),
            start_date: Set(start_date),
            end_date: Set(end_date),
            pi_id: Set(pi_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        apply_association_sets(
            &txn,
            project.id,
            input.lab_ids.as_deref(),
            input.compute_resource_ids.as_deref(),
            input.grant_ids.as_deref(),
        )
        .await?;
        txn.commit().await?;

        info!("Created project {} ({})", project.id, project.name);
        load_detail(&self.db, project.id).await
    }

    pub async fn list(&self, params: PageParams) -> CoreResult<Page<ProjectView>> {
        let page = paginate(&self.db, projects::Entity::find(), projects::Column::Id, params).await?;
        Ok(page.map(ProjectView::from))
    }

    pub async fn get(&self, id: i32) -> CoreResult<ProjectDetail> {
        load_detail(&self.db, id).await
    }

    pub async fn update(&self, id: i32, input: ProjectUpdate) -> CoreResult<ProjectDetail> {
        let txn = self.db.begin().await?;
        let existing = require_project(&txn, id).await?;
        let mut start_date = existing.start_date;
        let mut end_date = existing.end_date;
        let mut active: projects::ActiveModel = existing.into();

        if let Some(name) = input.name.as_deref() {
            active.name = Set(ValidationService::required_text("name", Some(name), 200)?);
        }
        if let Some(description) = input.description {
            active.description = Set(ValidationService::optional_text(
                "description",
                description.as_deref(),
                10_000,
            )?);
        }
        if let Some(value) = input.start_date.as_deref() {
            start_date = ValidationService::required_date("startDate", Some(value))?;
            active.start_date = Set(start_date);
        }
        if let Some(value) = input.end_date {
            end_date = ValidationService::optional_date("endDate", value.as_deref())?;
            active.end_date = Set(end_date);
        }
        ValidationService::date_order(Some(start_date), end_date, "endDate")?;

        if let Some(pi_id) =
            resolve_pi_change(&txn, "leadResearcherId", input.lead_researcher_id).await?
        {
            active.pi_id = Set(pi_id);
        }

        if active.is_changed() {
            active.update(&txn).await?;
        }
        apply_association_sets(
            &txn,
            id,
            input.lab_ids.as_deref(),
            input.compute_resource_ids.as_deref(),
            input.grant_ids.as_deref(),
        )
        .await?;
        txn.commit().await?;

        load_detail(&self.db, id).await
    }

    pub async fn delete(&self, id: i32) -> CoreResult<()> {
        let txn = self.db.begin().await?;
        graph_consistency::delete_project(&txn, id).await?;
        txn.commit().await?;
        info!("Deleted project {}", id);
        Ok(())
    }
}

async fn apply_association_sets<C: ConnectionTrait>(
    conn: &C,
    project_id: i32,
    lab_ids: Option<&[i32]>,
    compute_resource_ids: Option<&[i32]>,
    grant_ids: Option<&[i32]>,
) -> CoreResult<()> {
    if let Some(ids) = lab_ids {
        graph_consistency::replace_project_labs(conn, project_id, ids).await?;
    }
    if let Some(ids) = compute_resource_ids {
        graph_consistency::replace_project_compute_resources(conn, project_id, ids).await?;
    }
    if let Some(ids) = grant_ids {
        graph_consistency::replace_project_grants(conn, project_id, ids).await?;
    }
    Ok(())
}

pub async fn load_detail<C: ConnectionTrait>(conn: &C, id: i32) -> CoreResult<ProjectDetail> {
    let project = require_project(conn, id).await?;

    let lead_researcher = researchers::Entity::find_by_id(project.pi_id)
        .one(conn)
        .await?
        .as_ref()
        .map(ResearcherRef::from);

    let lab_ids = associations::lab_ids_of_project(conn, id).await?;
    let labs = labs::Entity::find()
        .filter(labs::Column::Id.is_in(lab_ids))
        .order_by_asc(labs::Column::Id)
        .all(conn)
        .await?;
    let resource_ids = associations::compute_resource_ids_of_project(conn, id).await?;
    let compute_resources = compute_resources::Entity::find()
        .filter(compute_resources::Column::Id.is_in(resource_ids))
        .order_by_asc(compute_resources::Column::Id)
        .all(conn)
        .await?;
    let grant_ids = associations::grant_ids_of_project(conn, id).await?;
    let grants = grants::Entity::find()
        .filter(grants::Column::Id.is_in(grant_ids))
        .order_by_asc(grants::Column::Id)
        .all(conn)
        .await?;
    let notes = notes::Entity::find()
        .filter(notes::Column::ProjectId.eq(id))
        .order_by_asc(notes::Column::Id)
        .all(conn)
        .await?;

    Ok(ProjectDetail {
        project: project.into(),
        lead_researcher,
        labs: labs.iter().map(LabRef::from).collect(),
        compute_resources: compute_resources.iter().map(ComputeResourceRef::from).collect(),
        grants: grants.iter().map(GrantRef::from).collect(),
        notes: notes.into_iter().map(NoteView::from).collect(),
    })
}
