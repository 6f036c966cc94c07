pub mod access;
pub mod config;
pub mod export;
pub mod issue;
pub mod model;
pub mod server;
pub mod store;
pub mod template;
pub mod utils;

// Re-export commonly used types
pub use access::{can_create, can_perform, Operation, Resource, ResourceType};
pub use config::{read_config, write_config, ConfigError, DaemonConfig};
pub use export::{excel_save, ExportError, ExportFile, ExportRow};
pub use issue::{IssueAppError, Reply, RequestContext, SearchCondition};
pub use model::{Issue, IssueComment, IssueLabel, Milestone, Project, State, User};
pub use server::{build_router, cors_layer, AppState};
pub use store::{InMemoryStore, IssueQuery, Store, StoreError};
pub use template::{TemplateEngine, TemplateError, View};
