//! Errores del motor de esquemas.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use track_domain::ValidationErrors;

/// Errores del límite de persistencia. El repositorio no valida nada: sólo
/// reporta lo que el almacenamiento sabe (existencia y unicidad de nombre).
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StoreError {
    #[error("scheme not found")] NotFound,
    #[error("draft not found")] DraftNotFound,
    #[error("scheme name already stored: {0}")] DuplicateName(String),
    #[error("backend: {0}")] Backend(String),
}

/// Motivo de un conflicto reportado por el motor.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum ConflictKind {
    #[error("a workflow scheme named '{0}' already exists")] DuplicateName(String),
    #[error("the scheme is active; the edit must target a draft")] ActiveScheme,
    #[error("the scheme is assigned to a project and cannot be deleted")] ActiveSchemeDelete,
    #[error("the scheme already has a draft")] DraftExists,
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum SchemeEngineError {
    #[error("workflow scheme not found")] SchemeNotFound,
    #[error("no draft exists for the scheme")] DraftNotFound,
    #[error("workflow '{0}' does not exist")] WorkflowNotFound(String),
    #[error("issue type '{0}' does not exist")] IssueTypeNotFound(String),
    #[error("validation failed: {0}")] Validation(ValidationErrors),
    #[error("conflict: {0}")] Conflict(ConflictKind),
    #[error("storage: {0}")] Store(#[from] StoreError),
}

/// Un `NotFound` del almacenamiento consultando la capa activa es un esquema
/// desconocido; cualquier otro error se propaga tal cual.
pub(crate) fn scheme_not_found(err: StoreError) -> SchemeEngineError {
    match err {
        StoreError::NotFound => SchemeEngineError::SchemeNotFound,
        other => SchemeEngineError::Store(other),
    }
}

/// El espacio de borradores responde `NotFound` tanto si falta el borrador
/// como si falta el padre.
pub(crate) fn draft_not_found(err: StoreError) -> SchemeEngineError {
    match err {
        StoreError::NotFound | StoreError::DraftNotFound => SchemeEngineError::DraftNotFound,
        other => SchemeEngineError::Store(other),
    }
}
