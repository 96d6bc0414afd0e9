use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `resource_type` and `status` hold the canonical names of
/// [`super::common_types::ResourceType`] and [`super::common_types::ResourceStatus`].
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "compute_resources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub resource_type: String,
    pub description: Option<String>,
    pub specification: String,
    pub status: String,
    pub cluster_type: Option<String>,
    pub nodes: Option<i32>,
    pub cpus_per_node: Option<i32>,
    pub gpus_per_node: Option<i32>,
    pub memory_per_node: Option<String>,
    pub storage_per_node: Option<String>,
    pub network_bandwidth: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project_compute_resources::Entity")]
    ProjectComputeResources,
}

impl Related<super::project_compute_resources::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectComputeResources.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
