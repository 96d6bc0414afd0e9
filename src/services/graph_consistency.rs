//! Referential integrity for every mutation of the entity graph
//!
//! The schema declares no cascading actions, so every delete clears its
//! dependent foreign keys and association rows explicitly, in a fixed order,
//! before removing the row itself. Association-set updates are full
//! replacements that check every referenced id before the first write.
//!
//! All functions take any [`ConnectionTrait`] so callers run them inside their
//! own transaction; a returned error means the caller must drop (roll back) it.

use std::fmt;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QuerySelect,
};
use tracing::debug;

use crate::database::entities::{
    compute_resources, grant_co_pis, grants, labs, notes, project_compute_resources,
    project_grants, project_labs, projects, researchers,
};
use crate::errors::{CoreError, CoreResult};
use crate::services::validation::dedupe_ids;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Researcher,
    Lab,
    Project,
    ComputeResource,
    Grant,
    Note,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Researcher => "Researcher",
            EntityKind::Lab => "Lab",
            EntityKind::Project => "Project",
            EntityKind::ComputeResource => "ComputeResource",
            EntityKind::Grant => "Grant",
            EntityKind::Note => "Note",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

async fn existing_ids<E, C>(conn: &C, id_column: E::Column, ids: &[i32]) -> CoreResult<Vec<i32>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let found: Vec<i32> = E::find()
        .select_only()
        .column(id_column)
        .filter(id_column.is_in(ids.iter().copied()))
        .into_tuple()
        .all(conn)
        .await?;
    Ok(found)
}

/// Fails with `NotFound` naming every id of `kind` that does not exist.
pub async fn ensure_ids_exist<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    ids: &[i32],
) -> CoreResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let found = match kind {
        EntityKind::Researcher => {
            existing_ids::<researchers::Entity, _>(conn, researchers::Column::Id, ids).await?
        }
        EntityKind::Lab => existing_ids::<labs::Entity, _>(conn, labs::Column::Id, ids).await?,
        EntityKind::Project => {
            existing_ids::<projects::Entity, _>(conn, projects::Column::Id, ids).await?
        }
        EntityKind::ComputeResource => {
            existing_ids::<compute_resources::Entity, _>(conn, compute_resources::Column::Id, ids)
                .await?
        }
        EntityKind::Grant => existing_ids::<grants::Entity, _>(conn, grants::Column::Id, ids).await?,
        EntityKind::Note => existing_ids::<notes::Entity, _>(conn, notes::Column::Id, ids).await?,
    };

    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::not_found(kind.label(), missing.join(", ")))
    }
}

pub async fn require_researcher<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> CoreResult<researchers::Model> {
    researchers::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::Researcher.label(), id))
}

pub async fn require_lab<C: ConnectionTrait>(conn: &C, id: i32) -> CoreResult<labs::Model> {
    labs::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::Lab.label(), id))
}

pub async fn require_project<C: ConnectionTrait>(conn: &C, id: i32) -> CoreResult<projects::Model> {
    projects::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::Project.label(), id))
}

pub async fn require_compute_resource<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> CoreResult<compute_resources::Model> {
    compute_resources::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::ComputeResource.label(), id))
}

pub async fn require_grant<C: ConnectionTrait>(conn: &C, id: i32) -> CoreResult<grants::Model> {
    grants::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| CoreError::not_found(EntityKind::Grant.label(), id))
}

/// Resolve a principal-investigator change on a Project or Grant.
///
/// `None` leaves the PI unchanged, `Some(None)` is an attempt to clear it.
pub async fn resolve_pi_change<C: ConnectionTrait>(
    conn: &C,
    field: &str,
    requested: Option<Option<i32>>,
) -> CoreResult<Option<i32>> {
    match requested {
        None => Ok(None),
        Some(None) => Err(CoreError::invalid_field(
            field,
            format!("{} cannot be null; a principal investigator is required", field),
        )),
        Some(Some(id)) => {
            require_researcher(conn, id).await?;
            Ok(Some(id))
        }
    }
}

pub async fn delete_researcher<C: ConnectionTrait>(conn: &C, id: i32) -> CoreResult<()> {
    require_researcher(conn, id).await?;

    let project_count = projects::Entity::find()
        .filter(projects::Column::PiId.eq(id))
        .count(conn)
        .await?;
    let grant_count = grants::Entity::find()
        .filter(grants::Column::PiId.eq(id))
        .count(conn)
        .await?;
    if project_count > 0 || grant_count > 0 {
        return Err(CoreError::conflict(format!(
            "Researcher {} is the principal investigator of {} project(s) and {} grant(s); reassign them before deleting",
            id, project_count, grant_count
        ))
        .with_field("projects", project_count.to_string())
        .with_field("grants", grant_count.to_string()));
    }

    labs::Entity::update_many()
        .col_expr(
            labs::Column::PrincipalInvestigatorId,
            Expr::value(Option::<i32>::None),
        )
        .filter(labs::Column::PrincipalInvestigatorId.eq(id))
        .exec(conn)
        .await?;
    grant_co_pis::Entity::delete_many()
        .filter(grant_co_pis::Column::ResearcherId.eq(id))
        .exec(conn)
        .await?;
    let removed_notes = notes::Entity::delete_many()
        .filter(notes::Column::ResearcherId.eq(id))
        .exec(conn)
        .await?;
    researchers::Entity::delete_by_id(id).exec(conn).await?;

    debug!(
        "Deleted researcher {} and {} note(s)",
        id, removed_notes.rows_affected
    );
    Ok(())
}

pub async fn delete_lab<C: ConnectionTrait>(conn: &C, id: i32) -> CoreResult<()> {
    require_lab(conn, id).await?;

    researchers::Entity::update_many()
        .col_expr(researchers::Column::LabId, Expr::value(Option::<i32>::None))
        .filter(researchers::Column::LabId.eq(id))
        .exec(conn)
        .await?;
    project_labs::Entity::delete_many()
        .filter(project_labs::Column::LabId.eq(id))
        .exec(conn)
        .await?;
    labs::Entity::delete_by_id(id).exec(conn).await?;

    debug!("Deleted lab {}", id);
    Ok(())
}

pub async fn delete_project<C: ConnectionTrait>(conn: &C, id: i32) -> CoreResult<()> {
    require_project(conn, id).await?;

    project_labs::Entity::delete_many()
        .filter(project_labs::Column::ProjectId.eq(id))
        .exec(conn)
        .await?;
    project_compute_resources::Entity::delete_many()
        .filter(project_compute_resources::Column::ProjectId.eq(id))
        .exec(conn)
        .await?;
    project_grants::Entity::delete_many()
        .filter(project_grants::Column::ProjectId.eq(id))
        .exec(conn)
        .await?;
    notes::Entity::delete_many()
        .filter(notes::Column::ProjectId.eq(id))
        .exec(conn)
        .await?;
    projects::Entity::delete_by_id(id).exec(conn).await?;

    debug!("Deleted project {}", id);
    Ok(())
}

pub async fn delete_compute_resource<C: ConnectionTrait>(conn: &C, id: i32) -> CoreResult<()> {
    require_compute_resource(conn, id).await?;

    project_compute_resources::Entity::delete_many()
        .filter(project_compute_resources::Column::ComputeResourceId.eq(id))
        .exec(conn)
        .await?;
    compute_resources::Entity::delete_by_id(id).exec(conn).await?;

    debug!("Deleted compute resource {}", id);
    Ok(())
}

pub async fn delete_grant<C: ConnectionTrait>(conn: &C, id: i32) -> CoreResult<()> {
    require_grant(conn, id).await?;

    project_grants::Entity::delete_many()
        .filter(project_grants::Column::GrantId.eq(id))
        .exec(conn)
        .await?;
    grant_co_pis::Entity::delete_many()
        .filter(grant_co_pis::Column::GrantId.eq(id))
        .exec(conn)
        .await?;
    grants::Entity::delete_by_id(id).exec(conn).await?;

    debug!("Deleted grant {}", id);
    Ok(())
}

/// Delete every row of `J` owned by `owner_id`, then insert one row per member.
async fn replace_rows<J, A, C, F>(
    conn: &C,
    owner_column: J::Column,
    owner_id: i32,
    members: &[i32],
    build: F,
) -> CoreResult<()>
where
    J: EntityTrait,
    J::Model: IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = J> + Send,
    C: ConnectionTrait,
    F: Fn(i32) -> A,
{
    J::delete_many()
        .filter(owner_column.eq(owner_id))
        .exec(conn)
        .await?;

    if members.is_empty() {
        return Ok(());
    }

    J::insert_many(members.iter().map(|member| build(*member)))
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

pub async fn replace_project_labs<C: ConnectionTrait>(
    conn: &C,
    project_id: i32,
    lab_ids: &[i32],
) -> CoreResult<()> {
    let lab_ids = dedupe_ids(lab_ids);
    require_project(conn, project_id).await?;
    ensure_ids_exist(conn, EntityKind::Lab, &lab_ids).await?;

    replace_rows::<project_labs::Entity, _, _, _>(
        conn,
        project_labs::Column::ProjectId,
        project_id,
        &lab_ids,
        |lab_id| project_labs::ActiveModel {
            project_id: sea_orm::Set(project_id),
            lab_id: sea_orm::Set(lab_id),
        },
    )
    .await
}

pub async fn replace_project_compute_resources<C: ConnectionTrait>(
    conn: &C,
    project_id: i32,
    compute_resource_ids: &[i32],
) -> CoreResult<()> {
    let compute_resource_ids = dedupe_ids(compute_resource_ids);
    require_project(conn, project_id).await?;
    ensure_ids_exist(conn, EntityKind::ComputeResource, &compute_resource_ids).await?;

    replace_rows::<project_compute_resources::Entity, _, _, _>(
        conn,
        project_compute_resources::Column::ProjectId,
        project_id,
        &compute_resource_ids,
        |compute_resource_id| project_compute_resources::ActiveModel {
            project_id: sea_orm::Set(project_id),
            compute_resource_id: sea_orm::Set(compute_resource_id),
        },
    )
    .await
}

pub async fn replace_project_grants<C: ConnectionTrait>(
    conn: &C,
    project_id: i32,
    grant_ids: &[i32],
) -> CoreResult<()> {
    let grant_ids = dedupe_ids(grant_ids);
    require_project(conn, project_id).await?;
    ensure_ids_exist(conn, EntityKind::Grant, &grant_ids).await?;

    replace_rows::<project_grants::Entity, _, _, _>(
        conn,
        project_grants::Column::ProjectId,
        project_id,
        &grant_ids,
        |grant_id| project_grants::ActiveModel {
            project_id: sea_orm::Set(project_id),
            grant_id: sea_orm::Set(grant_id),
        },
    )
    .await
}

pub async fn replace_grant_co_pis<C: ConnectionTrait>(
    conn: &C,
    grant_id: i32,
    researcher_ids: &[i32],
) -> CoreResult<()> {
    let researcher_ids = dedupe_ids(researcher_ids);
    require_grant(conn, grant_id).await?;
    ensure_ids_exist(conn, EntityKind::Researcher, &researcher_ids).await?;

    replace_rows::<grant_co_pis::Entity, _, _, _>(
        conn,
        grant_co_pis::Column::GrantId,
        grant_id,
        &researcher_ids,
        |researcher_id| grant_co_pis::ActiveModel {
            grant_id: sea_orm::Set(grant_id),
            researcher_id: sea_orm::Set(researcher_id),
        },
    )
    .await
}

pub async fn replace_lab_projects<C: ConnectionTrait>(
    conn: &C,
    lab_id: i32,
    project_ids: &[i32],
) -> CoreResult<()> {
    let project_ids = dedupe_ids(project_ids);
    require_lab(conn, lab_id).await?;
    ensure_ids_exist(conn, EntityKind::Project, &project_ids).await?;

    replace_rows::<project_labs::Entity, _, _, _>(
        conn,
        project_labs::Column::LabId,
        lab_id,
        &project_ids,
        |project_id| project_labs::ActiveModel {
            project_id: sea_orm::Set(project_id),
            lab_id: sea_orm::Set(lab_id),
        },
    )
    .await
}

pub async fn replace_compute_resource_projects<C: ConnectionTrait>(
    conn: &C,
    compute_resource_id: i32,
    project_ids: &[i32],
) -> CoreResult<()> {
    let project_ids = dedupe_ids(project_ids);
    require_compute_resource(conn, compute_resource_id).await?;
    ensure_ids_exist(conn, EntityKind::Project, &project_ids).await?;

    replace_rows::<project_compute_resources::Entity, _, _, _>(
        conn,
        project_compute_resources::Column::ComputeResourceId,
        compute_resource_id,
        &project_ids,
        |project_id| project_compute_resources::ActiveModel {
            project_id: sea_orm::Set(project_id),
            compute_resource_id: sea_orm::Set(compute_resource_id),
        },
    )
    .await
}

pub async fn replace_grant_projects<C: ConnectionTrait>(
    conn: &C,
    grant_id: i32,
    project_ids: &[i32],
) -> CoreResult<()> {
    let project_ids = dedupe_ids(project_ids);
    require_grant(conn, grant_id).await?;
    ensure_ids_exist(conn, EntityKind::Project, &project_ids).await?;

    replace_rows::<project_grants::Entity, _, _, _>(
        conn,
        project_grants::Column::GrantId,
        grant_id,
        &project_ids,
        |project_id| project_grants::ActiveModel {
            project_id: sea_orm::Set(project_id),
            grant_id: sea_orm::Set(grant_id),
        },
    )
    .await
}
