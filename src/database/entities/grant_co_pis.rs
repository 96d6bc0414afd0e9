use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grant_co_pis")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub grant_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub researcher_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::grants::Entity",
        from = "Column::GrantId",
        to = "super::grants::Column::Id"
    )]
    Grants,
    #[sea_orm(
        belongs_to = "super::researchers::Entity",
        from = "Column::ResearcherId",
        to = "super::researchers::Column::Id"
    )]
    Researchers,
}

impl Related<super::grants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grants.def()
    }
}

impl Related<super::researchers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Researchers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
