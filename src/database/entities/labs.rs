use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "labs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    pub principal_investigator_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::researchers::Entity",
        from = "Column::PrincipalInvestigatorId",
        to = "super::researchers::Column::Id"
    )]
    PrincipalInvestigator,
    #[sea_orm(has_many = "super::project_labs::Entity")]
    ProjectLabs,
}

impl Related<super::project_labs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectLabs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
