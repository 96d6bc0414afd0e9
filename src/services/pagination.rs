use sea_orm::{
    ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryOrder, Select,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::errors::{CoreError, CoreResult};
use crate::services::views::{
    ComputeResourceView, GrantView, LabView, ProjectView, ResearcherView,
};

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number (default 1)
    pub page: Option<u64>,
    /// Items per page (default 10, at most 100)
    pub per_page: Option<u64>,
}

impl PageParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    /// Row offset of the first item on the requested page. Fails when the
    /// page lies past anything SQLite can address.
    pub fn offset(&self) -> CoreResult<u64> {
        (self.page() - 1)
            .checked_mul(self.per_page())
            .filter(|offset| *offset <= i64::MAX as u64)
            .ok_or_else(|| {
                CoreError::invalid_field(
                    "page",
                    format!(
                        "page must be at most {}",
                        i64::MAX as u64 / self.per_page()
                    ),
                )
            })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[aliases(
    ResearcherPage = Page<ResearcherView>,
    LabPage = Page<LabView>,
    ProjectPage = Page<ProjectView>,
    ComputeResourcePage = Page<ComputeResourceView>,
    GrantPage = Page<GrantView>
)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            total_pages: self.total_pages,
            current_page: self.current_page,
            per_page: self.per_page,
        }
    }
}

/// Fetch one page of `query`, ordered by `order_column` ascending.
pub async fn paginate<E, C>(
    conn: &C,
    query: Select<E>,
    order_column: E::Column,
    params: PageParams,
) -> CoreResult<Page<E::Model>>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Sync,
    C: ConnectionTrait,
{
    let per_page = params.per_page();
    let current_page = params.page();
    params.offset()?;
    let paginator = query.order_by_asc(order_column).paginate(conn, per_page);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(current_page - 1).await?;

    Ok(Page {
        items,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
        current_page,
        per_page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 10);

        let params = PageParams {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 100);
    }

    #[test]
    fn offset_rejects_pages_past_the_addressable_range() {
        let params = PageParams {
            page: Some(3),
            per_page: Some(20),
        };
        assert_eq!(params.offset().unwrap(), 40);

        let params = PageParams {
            page: Some(u64::MAX),
            per_page: Some(10),
        };
        let err = params.offset().unwrap_err();
        assert_eq!(err.kind(), crate::errors::CoreErrorKind::Validation);

        let params = PageParams {
            page: Some(i64::MAX as u64),
            per_page: Some(1),
        };
        assert_eq!(params.offset().unwrap(), i64::MAX as u64 - 1);
    }

    #[tokio::test]
    async fn paginate_returns_validation_error_for_huge_page() {
        use crate::database::entities::researchers;
        use crate::database::test_utils::setup_test_db;

        let db = setup_test_db().await.unwrap();
        let params = PageParams {
            page: Some(9_223_372_036_854_775_807),
            per_page: Some(10),
        };
        let err = paginate(
            &db,
            researchers::Entity::find(),
            researchers::Column::Id,
            params,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), crate::errors::CoreErrorKind::Validation);
    }
}
