//! Read side of the association sets: current membership of a join relation,
//! materialized on demand and ordered by member id.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::database::entities::{
    grant_co_pis, project_compute_resources, project_grants, project_labs,
};
use crate::errors::CoreResult;

async fn member_ids<J, C>(
    conn: &C,
    owner_column: J::Column,
    member_column: J::Column,
    owner_id: i32,
) -> CoreResult<Vec<i32>>
where
    J: EntityTrait,
    C: ConnectionTrait,
{
    let ids: Vec<i32> = J::find()
        .select_only()
        .column(member_column)
        .filter(owner_column.eq(owner_id))
        .order_by_asc(member_column)
        .into_tuple()
        .all(conn)
        .await?;
    Ok(ids)
}

pub async fn lab_ids_of_project<C: ConnectionTrait>(conn: &C, project_id: i32) -> CoreResult<Vec<i32>> {
    member_ids::<project_labs::Entity, _>(
        conn,
        project_labs::Column::ProjectId,
        project_labs::Column::LabId,
        project_id,
    )
    .await
}

pub async fn compute_resource_ids_of_project<C: ConnectionTrait>(
    conn: &C,
    project_id: i32,
) -> CoreResult<Vec<i32>> {
    member_ids::<project_compute_resources::Entity, _>(
        conn,
        project_compute_resources::Column::ProjectId,
        project_compute_resources::Column::ComputeResourceId,
        project_id,
    )
    .await
}

pub async fn grant_ids_of_project<C: ConnectionTrait>(
    conn: &C,
    project_id: i32,
) -> CoreResult<Vec<i32>> {
    member_ids::<project_grants::Entity, _>(
        conn,
        project_grants::Column::ProjectId,
        project_grants::Column::GrantId,
        project_id,
    )
    .await
}

pub async fn co_pi_ids_of_grant<C: ConnectionTrait>(conn: &C, grant_id: i32) -> CoreResult<Vec<i32>> {
    member_ids::<grant_co_pis::Entity, _>(
        conn,
        grant_co_pis::Column::GrantId,
        grant_co_pis::Column::ResearcherId,
        grant_id,
    )
    .await
}

pub async fn project_ids_of_lab<C: ConnectionTrait>(conn: &C, lab_id: i32) -> CoreResult<Vec<i32>> {
    member_ids::<project_labs::Entity, _>(
        conn,
        project_labs::Column::LabId,
        project_labs::Column::ProjectId,
        lab_id,
    )
    .await
}

pub async fn project_ids_of_compute_resource<C: ConnectionTrait>(
    conn: &C,
    compute_resource_id: i32,
) -> CoreResult<Vec<i32>> {
    member_ids::<project_compute_resources::Entity, _>(
        conn,
        project_compute_resources::Column::ComputeResourceId,
        project_compute_resources::Column::ProjectId,
        compute_resource_id,
    )
    .await
}

pub async fn project_ids_of_grant<C: ConnectionTrait>(conn: &C, grant_id: i32) -> CoreResult<Vec<i32>> {
    member_ids::<project_grants::Entity, _>(
        conn,
        project_grants::Column::GrantId,
        project_grants::Column::ProjectId,
        grant_id,
    )
    .await
}

/// Grants on which the researcher is a co-investigator
pub async fn co_pi_grant_ids_of_researcher<C: ConnectionTrait>(
    conn: &C,
    researcher_id: i32,
) -> CoreResult<Vec<i32>> {
    member_ids::<grant_co_pis::Entity, _>(
        conn,
        grant_co_pis::Column::ResearcherId,
        grant_co_pis::Column::GrantId,
        researcher_id,
    )
    .await
}
