//! Wire format of the full-graph export/import document
//!
//! Every reference is a string id. Ids written by an export are the row ids
//! rendered as text; on import they are opaque keys resolved through the
//! [`IdentityMapper`](crate::services::identity_mapper::IdentityMapper).
//! Numeric ids are accepted on input and normalised to text.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
#[schema(value_type = String)]
pub struct ExternalId(pub String);

impl ExternalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i32> for ExternalId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for ExternalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ExternalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ExternalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = ExternalId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or integer id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ExternalId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ExternalId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ExternalId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Top-level collections are optional at the serde level so that a missing
/// one is reported by the import's validate phase rather than the decoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub researchers: Option<Vec<ResearcherRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labs: Option<Vec<LabRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ProjectRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_resources: Option<Vec<ComputeResourceRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grants: Option<Vec<GrantRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearcherRecord {
    pub id: ExternalId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub lab_id: Option<ExternalId>,
    #[serde(default)]
    pub notes: Vec<NoteRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: ExternalId,
    #[serde(default)]
    pub researcher_id: Option<ExternalId>,
    #[serde(default)]
    pub project_id: Option<ExternalId>,
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabRecord {
    pub id: ExternalId,
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub principal_investigator_id: Option<ExternalId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: ExternalId,
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub lead_researcher_id: Option<ExternalId>,
    #[serde(default)]
    pub lab_ids: Vec<ExternalId>,
    #[serde(default)]
    pub compute_resource_ids: Vec<ExternalId>,
    #[serde(default)]
    pub grant_ids: Vec<ExternalId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResourceRecord {
    pub id: ExternalId,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub specification: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub cluster_type: Option<String>,
    #[serde(default)]
    pub nodes: Option<i32>,
    #[serde(default)]
    pub cpus_per_node: Option<i32>,
    #[serde(default)]
    pub gpus_per_node: Option<i32>,
    #[serde(default)]
    pub memory_per_node: Option<String>,
    #[serde(default)]
    pub storage_per_node: Option<String>,
    #[serde(default)]
    pub network_bandwidth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantRecord {
    pub id: ExternalId,
    pub title: Option<String>,
    pub agency: Option<String>,
    #[serde(default)]
    pub grant_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub status: Option<String>,
    #[serde(default)]
    pub proposal_due_date: Option<String>,
    #[serde(default)]
    pub award_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub principal_investigator_id: Option<ExternalId>,
    #[serde(default)]
    pub co_pi_ids: Vec<ExternalId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    pub researchers: usize,
    pub labs: usize,
    pub projects: usize,
    pub compute_resources: usize,
    pub grants: usize,
    pub notes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    pub message: String,
    pub created: ImportCounts,
}
