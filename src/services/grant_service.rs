use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::database::entities::{grants, projects, researchers, GrantStatus};
use crate::errors::{CoreError, CoreResult};
use crate::services::associations;
use crate::services::graph_consistency::{
    self, require_grant, require_researcher, resolve_pi_change,
};
use crate::services::pagination::{paginate, Page, PageParams};
use crate::services::validation::{deserialize_some, ValidationService};
use crate::services::views::{GrantView, ProjectRef, ResearcherRef};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewGrant {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    /// One of PENDING, ACTIVE, CLOSED, REJECTED
    pub status: Option<String>,
    pub agency: Option<String>,
    pub grant_number: Option<String>,
    pub proposal_due_date: Option<String>,
    pub award_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub principal_investigator_id: Option<i32>,
    pub co_pi_ids: Option<Vec<i32>>,
    pub project_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub amount: Option<f64>,
    pub status: Option<String>,
    pub agency: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub grant_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub proposal_due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub award_date: Option<Option<String>>,
    /// Required once set; `null` is rejected like on create
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub start_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub end_date: Option<Option<String>>,
    /// Must name an existing researcher; `null` is rejected
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub principal_investigator_id: Option<Option<i32>>,
    pub co_pi_ids: Option<Vec<i32>>,
    pub project_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantDetail {
    #[serde(flatten)]
    pub grant: GrantView,
    pub principal_investigator: Option<ResearcherRef>,
    pub co_pis: Vec<ResearcherRef>,
    pub projects: Vec<ProjectRef>,
}

pub(crate) fn parse_status(value: Option<&str>) -> CoreResult<GrantStatus> {
    match value.map(str::trim) {
        None | Some("") => Err(CoreError::invalid_field(
            "status",
            format!(
                "status is required. Valid values are: {}",
                GrantStatus::valid_values().join(", ")
            ),
        )),
        Some(v) => GrantStatus::parse(v),
    }
}

#[derive(Clone)]
pub struct GrantService {
    db: DatabaseConnection,
}

impl GrantService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: NewGrant) -> CoreResult<GrantDetail> {
        let title = ValidationService::required_text("title", input.title.as_deref(), 200)?;
        let agency = ValidationService::required_text("agency", input.agency.as_deref(), 150)?;
        let amount = ValidationService::non_negative_amount("amount", input.amount)?;
        let status = parse_status(input.status.as_deref())?;
        let description =
            ValidationService::optional_text("description", input.description.as_deref(), 10_000)?;
        let grant_number =
            ValidationService::optional_text("grantNumber", input.grant_number.as_deref(), 100)?;
        let proposal_due_date = ValidationService::optional_date(
            "proposalDueDate",
            input.proposal_due_date.as_deref(),
        )?;
        let award_date = ValidationService::optional_date("awardDate", input.award_date.as_deref())?;
        let start_date = ValidationService::required_date("startDate", input.start_date.as_deref())?;
        let end_date = ValidationService::required_date("endDate", input.end_date.as_deref())?;
        ValidationService::date_order(Some(start_date), Some(end_date), "endDate")?;
        let pi_id =
            ValidationService::required_id("principalInvestigatorId", input.principal_investigator_id)?;

        let txn = self.db.begin().await?;
        require_researcher(&txn, pi_id).await?;
        if let Some(number) = grant_number.as_deref() {
            ensure_grant_number_available(&txn, number, None).await?;
        }

        let grant = grants::ActiveModel {
            title: Set(title),
            description: Set(description),
            amount: Set(amount),
            status: Set(status.as_str().to_string()),
            agency: Set(agency),
            grant_number: Set(grant_number),
            proposal_due_date: Set(proposal_due_date),
            award_date: Set(award_date),
            start_date: Set(Some(start_date)),
            end_date: Set(Some(end_date)),
            pi_id: Set(pi_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let Some(ids) = input.co_pi_ids.as_deref() {
            graph_consistency::replace_grant_co_pis(&txn, grant.id, ids).await?;
        }
        if let Some(ids) = input.project_ids.as_deref() {
            graph_consistency::replace_grant_projects(&txn, grant.id, ids).await?;
        }
        txn.commit().await?;

        info!("Created grant {} ({})", grant.id, grant.title);
        load_detail(&self.db, grant.id).await
    }

    pub async fn list(&self, params: PageParams) -> CoreResult<Page<GrantView>> {
        let page = paginate(&self.db, grants::Entity::find(), grants::Column::Id, params).await?;
        Ok(page.map(GrantView::from))
    }

    pub async fn get(&self, id: i32) -> CoreResult<GrantDetail> {
        load_detail(&self.db, id).await
    }

    pub async fn update(&self, id: i32, input: GrantUpdate) -> CoreResult<GrantDetail> {
        let txn = self.db.begin().await?;
        let existing = require_grant(&txn, id).await?;
        let mut start_date = existing.start_date;
        let mut end_date = existing.end_date;
        let mut active: grants::ActiveModel = existing.into();

        if let Some(title) = input.title.as_deref() {
            active.title = Set(ValidationService::required_text("title", Some(title), 200)?);
        }
        if let Some(description) = input.description {
            active.description = Set(ValidationService::optional_text(
                "description",
                description.as_deref(),
                10_000,
            )?);
        }
        if input.amount.is_some() {
            active.amount = Set(ValidationService::non_negative_amount("amount", input.amount)?);
        }
        if input.status.is_some() {
            let status = parse_status(input.status.as_deref())?;
            active.status = Set(status.as_str().to_string());
        }
        if let Some(agency) = input.agency.as_deref() {
            active.agency = Set(ValidationService::required_text("agency", Some(agency), 150)?);
        }
        if let Some(number) = input.grant_number {
            let number = ValidationService::optional_text("grantNumber", number.as_deref(), 100)?;
            if let Some(number) = number.as_deref() {
                ensure_grant_number_available(&txn, number, Some(id)).await?;
            }
            active.grant_number = Set(number);
        }
        if let Some(value) = input.proposal_due_date {
            active.proposal_due_date = Set(ValidationService::optional_date(
                "proposalDueDate",
                value.as_deref(),
            )?);
        }
        if let Some(value) = input.award_date {
            active.award_date = Set(ValidationService::optional_date("awardDate", value.as_deref())?);
        }
        if let Some(value) = input.start_date {
            start_date = Some(ValidationService::required_date("startDate", value.as_deref())?);
            active.start_date = Set(start_date);
        }
        if let Some(value) = input.end_date {
            end_date = Some(ValidationService::required_date("endDate", value.as_deref())?);
            active.end_date = Set(end_date);
        }
        ValidationService::date_order(start_date, end_date, "endDate")?;

        if let Some(pi_id) =
            resolve_pi_change(&txn, "principalInvestigatorId", input.principal_investigator_id)
                .await?
        {
            active.pi_id = Set(pi_id);
        }

        if active.is_changed() {
            active.update(&txn).await?;
        }
        if let Some(ids) = input.co_pi_ids.as_deref() {
            graph_consistency::replace_grant_co_pis(&txn, id, ids).await?;
        }
        if let Some(ids) = input.project_ids.as_deref() {
            graph_consistency::replace_grant_projects(&txn, id, ids).await?;
        }
        txn.commit().await?;

        load_detail(&self.db, id).await
    }

    pub async fn delete(&self, id: i32) -> CoreResult<()> {
        let txn = self.db.begin().await?;
        graph_consistency::delete_grant(&txn, id).await?;
        txn.commit().await?;
        info!("Deleted grant {}", id);
        Ok(())
    }
}

async fn ensure_grant_number_available<C: ConnectionTrait>(
    conn: &C,
    number: &str,
    exclude_id: Option<i32>,
) -> CoreResult<()> {
    let mut query = grants::Entity::find().filter(grants::Column::GrantNumber.eq(number));
    if let Some(id) = exclude_id {
        query = query.filter(grants::Column::Id.ne(id));
    }
    if query.one(conn).await?.is_some() {
        return Err(CoreError::conflict(format!(
            "A grant with number '{}' already exists",
            number
        ))
        .with_field("field", "grantNumber"));
    }
    Ok(())
}

pub async fn load_detail<C: ConnectionTrait>(conn: &C, id: i32) -> CoreResult<GrantDetail> {
    let grant = require_grant(conn, id).await?;

    let principal_investigator = researchers::Entity::find_by_id(grant.pi_id)
        .one(conn)
        .await?
        .as_ref()
        .map(ResearcherRef::from);
    let co_pi_ids = associations::co_pi_ids_of_grant(conn, id).await?;
    let co_pis = researchers::Entity::find()
        .filter(researchers::Column::Id.is_in(co_pi_ids))
        .order_by_asc(researchers::Column::Id)
        .all(conn)
        .await?;
    let project_ids = associations::project_ids_of_grant(conn, id).await?;
    let projects = projects::Entity::find()
        .filter(projects::Column::Id.is_in(project_ids))
        .order_by_asc(projects::Column::Id)
        .all(conn)
        .await?;

    Ok(GrantDetail {
        grant: grant.into(),
        principal_investigator,
        co_pis: co_pis.iter().map(ResearcherRef::from).collect(),
        projects: projects.iter().map(ProjectRef::from).collect(),
    })
}
