pub mod ai_assistant_service;
pub mod associations;
pub mod compute_resource_service;
pub mod export_service;
pub mod grant_service;
pub mod graph_consistency;
pub mod identity_mapper;
pub mod import_service;
pub mod lab_service;
pub mod note_service;
pub mod pagination;
pub mod project_service;
pub mod researcher_service;
pub mod snapshot;
pub mod validation;
pub mod views;

pub use ai_assistant_service::AiAssistantService;
pub use compute_resource_service::ComputeResourceService;
pub use export_service::ExportService;
pub use grant_service::GrantService;
pub use import_service::ImportService;
pub use lab_service::LabService;
pub use note_service::NoteService;
pub use project_service::ProjectService;
pub use researcher_service::ResearcherService;
