use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    pub status: String,
    pub agency: String,
    #[sea_orm(unique)]
    pub grant_number: Option<String>,
    pub proposal_due_date: Option<Date>,
    pub award_date: Option<Date>,
    pub start_date: Option<Date>,
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
    #[sea_orm(has_many = "super::grant_co_pis::Entity")]
    GrantCoPis,
    #[sea_orm(has_many = "super::project_grants::Entity")]
    ProjectGrants,
}

impl Related<super::researchers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrincipalInvestigator.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
