// track-domain library entry point
pub mod catalog;
pub mod error;
pub mod mapping;
pub mod scheme;
pub mod update;
pub mod validate;
pub use catalog::{IssueTypeCatalog, WorkflowCatalog, SYSTEM_DEFAULT_WORKFLOW};
pub use error::{FieldError, ValidationErrors};
pub use mapping::{group_by_workflow, IssueTypeMapping, WorkflowMapping};
pub use scheme::{DraftScheme, IssueTypeMappings, NewScheme, SchemeId, SchemeView, WorkflowScheme};
pub use update::{Patch, SchemeUpdate};
pub use validate::{name_in_use_error, validate_scheme, SchemeCandidate, MAX_NAME_LEN};
