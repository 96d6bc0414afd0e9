use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::database::entities::{compute_resources, projects, ResourceStatus, ResourceType};
use crate::errors::{CoreError, CoreResult};
use crate::services::associations;
use crate::services::graph_consistency::{self, require_compute_resource};
use crate::services::pagination::{paginate, Page, PageParams};
use crate::services::validation::{deserialize_some, ValidationService};
use crate::services::views::{ComputeResourceView, ProjectRef};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewComputeResource {
    pub name: Option<String>,
    /// One of CPU, GPU, TPU
    #[serde(rename = "type", alias = "resourceType")]
    pub resource_type: Option<String>,
    pub description: Option<String>,
    pub specification: Option<String>,
    /// One of AVAILABLE, IN_USE, MAINTENANCE, RETIRED
    pub status: Option<String>,
    pub cluster_type: Option<String>,
    pub nodes: Option<i32>,
    pub cpus_per_node: Option<i32>,
    pub gpus_per_node: Option<i32>,
    pub memory_per_node: Option<String>,
    pub storage_per_node: Option<String>,
    pub network_bandwidth: Option<String>,
    pub project_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResourceUpdate {
    pub name: Option<String>,
    #[serde(rename = "type", alias = "resourceType")]
    pub resource_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub specification: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub cluster_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub nodes: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub cpus_per_node: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub gpus_per_node: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub memory_per_node: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub storage_per_node: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub network_bandwidth: Option<Option<String>>,
    pub project_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResourceDetail {
    #[serde(flatten)]
    pub compute_resource: ComputeResourceView,
    pub projects: Vec<ProjectRef>,
}

pub(crate) fn parse_type(value: Option<&str>) -> CoreResult<ResourceType> {
    match value.map(str::trim) {
        None | Some("") => Err(CoreError::invalid_field(
            "type",
            format!(
                "type is required. Valid values are: {}",
                ResourceType::valid_values().join(", ")
            ),
        )),
        Some(v) => ResourceType::parse(v),
    }
}

pub(crate) fn parse_status(value: Option<&str>) -> CoreResult<ResourceStatus> {
    match value.map(str::trim) {
        None | Some("") => Err(CoreError::invalid_field(
            "status",
            format!(
                "status is required. Valid values are: {}",
                ResourceStatus::valid_values().join(", ")
            ),
        )),
        Some(v) => ResourceStatus::parse(v),
    }
}

#[derive(Clone)]
pub struct ComputeResourceService {
    db: DatabaseConnection,
}

impl ComputeResourceService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: NewComputeResource) -> CoreResult<ComputeResourceDetail> {
        let name = ValidationService::required_text("name", input.name.as_deref(), 100)?;
        let resource_type = parse_type(input.resource_type.as_deref())?;
        let specification =
            ValidationService::required_text("specification", input.specification.as_deref(), 255)?;
        let status = parse_status(input.status.as_deref())?;

        let resource = compute_resources::ActiveModel {
            name: Set(name),
            resource_type: Set(resource_type.as_str().to_string()),
            description: Set(ValidationService::optional_text(
                "description",
                input.description.as_deref(),
                5000,
            )?),
            specification: Set(specification),
            status: Set(status.as_str().to_string()),
            cluster_type: Set(ValidationService::optional_text(
                "clusterType",
                input.cluster_type.as_deref(),
                100,
            )?),
            nodes: Set(ValidationService::optional_count("nodes", input.nodes)?),
            cpus_per_node: Set(ValidationService::optional_count(
                "cpusPerNode",
                input.cpus_per_node,
            )?),
            gpus_per_node: Set(ValidationService::optional_count(
                "gpusPerNode",
                input.gpus_per_node,
            )?),
            memory_per_node: Set(ValidationService::optional_text(
                "memoryPerNode",
                input.memory_per_node.as_deref(),
                50,
            )?),
            storage_per_node: Set(ValidationService::optional_text(
                "storagePerNode",
                input.storage_per_node.as_deref(),
                50,
            )?),
            network_bandwidth: Set(ValidationService::optional_text(
                "networkBandwidth",
                input.network_bandwidth.as_deref(),
                50,
            )?),
            ..Default::default()
        };

        let txn = self.db.begin().await?;
        let resource = resource.insert(&txn).await?;
        if let Some(project_ids) = input.project_ids.as_deref() {
            graph_consistency::replace_compute_resource_projects(&txn, resource.id, project_ids)
                .await?;
        }
        txn.commit().await?;

        info!(
            "Created compute resource {} ({}, {})",
            resource.id, resource.name, resource.resource_type
        );
        load_detail(&self.db, resource.id).await
    }

    pub async fn list(&self, params: PageParams) -> CoreResult<Page<ComputeResourceView>> {
        let page = paginate(
            &self.db,
            compute_resources::Entity::find(),
            compute_resources::Column::Id,
            params,
        )
        .await?;
        Ok(page.map(ComputeResourceView::from))
    }

    pub async fn get(&self, id: i32) -> CoreResult<ComputeResourceDetail> {
        load_detail(&self.db, id).await
    }

    pub async fn update(
        &self,
        id: i32,
        input: ComputeResourceUpdate,
    ) -> CoreResult<ComputeResourceDetail> {
        let txn = self.db.begin().await?;
        let existing = require_compute_resource(&txn, id).await?;
        let mut active: compute_resources::ActiveModel = existing.into();

        if let Some(name) = input.name.as_deref() {
            active.name = Set(ValidationService::required_text("name", Some(name), 100)?);
        }
        if input.resource_type.is_some() {
            let resource_type = parse_type(input.resource_type.as_deref())?;
            active.resource_type = Set(resource_type.as_str().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(ValidationService::optional_text(
                "description",
                description.as_deref(),
                5000,
            )?);
        }
        if let Some(specification) = input.specification.as_deref() {
            active.specification = Set(ValidationService::required_text(
                "specification",
                Some(specification),
                255,
            )?);
        }
        if input.status.is_some() {
            let status = parse_status(input.status.as_deref())?;
            active.status = Set(status.as_str().to_string());
        }
        if let Some(value) = input.cluster_type {
            active.cluster_type = Set(ValidationService::optional_text(
                "clusterType",
                value.as_deref(),
                100,
            )?);
        }
        if let Some(value) = input.nodes {
            active.nodes = Set(ValidationService::optional_count("nodes", value)?);
        }
        if let Some(value) = input.cpus_per_node {
            active.cpus_per_node = Set(ValidationService::optional_count("cpusPerNode", value)?);
        }
        if let Some(value) = input.gpus_per_node {
            active.gpus_per_node = Set(ValidationService::optional_count("gpusPerNode", value)?);
        }
        if let Some(value) = input.memory_per_node {
            active.memory_per_node = Set(ValidationService::optional_text(
                "memoryPerNode",
                value.as_deref(),
                50,
            )?);
        }
        if let Some(value) = input.storage_per_node {
            active.storage_per_node = Set(ValidationService::optional_text(
                "storagePerNode",
                value.as_deref(),
                50,
            )?);
        }
        if let Some(value) = input.network_bandwidth {
            active.network_bandwidth = Set(ValidationService::optional_text(
                "networkBandwidth",
                value.as_deref(),
                50,
            )?);
        }

        if active.is_changed() {
            active.update(&txn).await?;
        }
        if let Some(project_ids) = input.project_ids.as_deref() {
            graph_consistency::replace_compute_resource_projects(&txn, id, project_ids).await?;
        }
        txn.commit().await?;

        load_detail(&self.db, id).await
    }

    pub async fn delete(&self, id: i32) -> CoreResult<()> {
        let txn = self.db.begin().await?;
        graph_consistency::delete_compute_resource(&txn, id).await?;
        txn.commit().await?;
        info!("Deleted compute resource {}", id);
        Ok(())
    }
}

pub async fn load_detail<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> CoreResult<ComputeResourceDetail> {
    let resource = require_compute_resource(conn, id).await?;
    let project_ids = associations::project_ids_of_compute_resource(conn, id).await?;
    let projects = projects::Entity::find()
        .filter(projects::Column::Id.is_in(project_ids))
        .order_by_asc(projects::Column::Id)
        .all(conn)
        .await?;

    Ok(ComputeResourceDetail {
        compute_resource: resource.into(),
        projects: projects.iter().map(ProjectRef::from).collect(),
    })
}
