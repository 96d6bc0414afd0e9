//! Response shapes shared by the entity services.
//!
//! `*View` types are the flat representation of one row; `*Ref` types are the
//! compact form used when an entity appears inside another entity's detail.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::database::entities::{compute_resources, grants, labs, notes, projects, researchers};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearcherRef {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<&researchers::Model> for ResearcherRef {
    fn from(model: &researchers::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            email: model.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabRef {
    pub id: i32,
    pub name: String,
}

impl From<&labs::Model> for LabRef {
    fn from(model: &labs::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: i32,
    pub name: String,
}

impl From<&projects::Model> for ProjectRef {
    fn from(model: &projects::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResourceRef {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub status: String,
}

impl From<&compute_resources::Model> for ComputeResourceRef {
    fn from(model: &compute_resources::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            resource_type: model.resource_type.clone(),
            status: model.status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantRef {
    pub id: i32,
    pub title: String,
    pub status: String,
}

impl From<&grants::Model> for GrantRef {
    fn from(model: &grants::Model) -> Self {
        Self {
            id: model.id,
            title: model.title.clone(),
            status: model.status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub researcher_id: i32,
    pub project_id: Option<i32>,
}

impl From<notes::Model> for NoteView {
    fn from(model: notes::Model) -> Self {
        Self {
            id: model.id,
            content: model.content,
            created_at: model.created_at,
            updated_at: model.updated_at,
            researcher_id: model.researcher_id,
            project_id: model.project_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearcherView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub department: String,
    pub bio: Option<String>,
    pub lab_id: Option<i32>,
}

impl From<researchers::Model> for ResearcherView {
    fn from(model: researchers::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            department: model.department,
            bio: model.bio,
            lab_id: model.lab_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub principal_investigator_id: Option<i32>,
}

impl From<labs::Model> for LabView {
    fn from(model: labs::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            principal_investigator_id: model.principal_investigator_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub lead_researcher_id: i32,
}

impl From<projects::Model> for ProjectView {
    fn from(model: projects::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            start_date: model.start_date,
            end_date: model.end_date,
            lead_researcher_id: model.pi_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResourceView {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
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

impl From<compute_resources::Model> for ComputeResourceView {
    fn from(model: compute_resources::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            resource_type: model.resource_type,
            description: model.description,
            specification: model.specification,
            status: model.status,
            cluster_type: model.cluster_type,
            nodes: model.nodes,
            cpus_per_node: model.cpus_per_node,
            gpus_per_node: model.gpus_per_node,
            memory_per_node: model.memory_per_node,
            storage_per_node: model.storage_per_node,
            network_bandwidth: model.network_bandwidth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantView {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub status: String,
    pub agency: String,
    pub grant_number: Option<String>,
    pub proposal_due_date: Option<NaiveDate>,
    pub award_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub principal_investigator_id: i32,
}

impl From<grants::Model> for GrantView {
    fn from(model: grants::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            amount: model.amount,
            status: model.status,
            agency: model.agency,
            grant_number: model.grant_number,
            proposal_due_date: model.proposal_due_date,
            award_date: model.award_date,
            start_date: model.start_date,
            end_date: model.end_date,
            principal_investigator_id: model.pi_id,
        }
    }
}
