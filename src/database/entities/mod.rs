pub mod common_types;
pub mod compute_resources;
pub mod grant_co_pis;
pub mod grants;
pub mod labs;
pub mod notes;
pub mod project_compute_resources;
pub mod project_grants;
pub mod project_labs;
pub mod projects;
pub mod researchers;

pub use common_types::{GrantStatus, ResourceStatus, ResourceType};
