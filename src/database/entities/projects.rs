use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub pi_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::researchers::Entity",
        from = "Column::PiId",
        to = "super::researchers::Column::Id"
    )]
    PrincipalInvestigator,
    #[sea_orm(has_many = "super::notes::Entity")]
    Notes,
    #[sea_orm(has_many = "super::project_labs::Entity")]
    ProjectLabs,
    #[sea_orm(has_many = "super::project_compute_resources::Entity")]
    ProjectComputeResources,
    #[sea_orm(has_many = "super::project_grants::Entity")]
    ProjectGrants,
}

impl Related<super::researchers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrincipalInvestigator.def()
    }
}

impl Related<super::notes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
