//! track-core: motor de configuración de esquemas de workflows
pub mod engine;
pub mod errors;
pub mod oracle;
mod overlay;
pub mod repo;

pub use engine::{EngineBuilderInit, WorkflowSchemeEngine};
pub use errors::{ConflictKind, SchemeEngineError, StoreError};
pub use oracle::ActivationOracle;
pub use repo::{InMemorySchemeRepository, SchemeRepository};
