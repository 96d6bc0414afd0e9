pub mod ai;
pub mod compute_resources;
pub mod data;
pub mod grants;
pub mod health;
pub mod labs;
pub mod projects;
pub mod researchers;

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
