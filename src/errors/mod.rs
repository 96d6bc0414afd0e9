//! Error types shared by the services and the HTTP layer
//!
//! - **CoreError**: every service-level failure, tagged with a [`CoreErrorKind`]
//!   that the server maps onto an HTTP status.
//! - **AiServiceError**: failures of the hosted text-generation collaborator.

pub mod ai;
pub mod core_error;

pub use ai::AiServiceError;
pub use core_error::{CoreError, CoreErrorKind, CoreResult};
