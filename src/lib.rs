//! TrackFlow Rust Library
//!
//! Este crate actúa como la fachada del workspace:
//! - `track-domain`: tipos de esquema, actualización parcial y validación.
//! - `track-core`: motor de configuración (repositorio, borradores, guarda
//!   de activación).
//! - `track-adapters`: catálogos estáticos y registro de asignaciones.
//!
//! Puede usarse desde `main.rs` (demo) o por otros crates/clientes.

pub use track_adapters::{ProjectAssignmentRegistry, StaticIssueTypeCatalog, StaticWorkflowCatalog};
pub use track_core::{ActivationOracle, ConflictKind, InMemorySchemeRepository, SchemeEngineError,
                     SchemeRepository, StoreError, WorkflowSchemeEngine};
pub use track_domain::{DraftScheme, IssueTypeCatalog, IssueTypeMappings, NewScheme, Patch, SchemeId,
                       SchemeUpdate, SchemeView, ValidationErrors, WorkflowCatalog, WorkflowScheme,
                       SYSTEM_DEFAULT_WORKFLOW};
