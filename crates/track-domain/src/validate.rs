//! Validación pura de un candidato de esquema contra los catálogos.
//!
//! Las reglas se acumulan (no hay corto-circuito) en un orden fijo: nombre,
//! default, entradas del mapeo. Así el primer error es estable para los
//! consumidores que sólo muestran uno.

use crate::catalog::{IssueTypeCatalog, WorkflowCatalog};
use crate::error::{FieldError, ValidationErrors};
use crate::scheme::IssueTypeMappings;

pub const MAX_NAME_LEN: usize = 255;

/// Candidato a validar. La unicidad del nombre no se resuelve aquí (la
/// función es pura): el llamador consulta la capa activa, excluye el propio
/// id del esquema y pasa el resultado en `name_in_use`.
#[derive(Debug)]
pub struct SchemeCandidate<'a> {
    pub name: &'a str,
    pub default_workflow: Option<&'a str>,
    pub mappings: &'a IssueTypeMappings,
    pub name_in_use: bool,
}

/// Error de unicidad de nombre, expuesto para que el motor pueda distinguir
/// el caso "sólo colisión de nombre" y reportarlo como conflicto.
pub fn name_in_use_error(name: &str) -> FieldError {
    FieldError::new("name", format!("a workflow scheme named '{name}' already exists"))
}

pub fn validate_scheme(candidate: &SchemeCandidate<'_>,
                       workflows: &dyn WorkflowCatalog,
                       issue_types: &dyn IssueTypeCatalog)
                       -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if candidate.name.trim().is_empty() {
        errors.add("name", "name must not be empty");
    } else if candidate.name.chars().count() > MAX_NAME_LEN {
        errors.add("name", format!("name must be at most {MAX_NAME_LEN} characters"));
    } else if candidate.name_in_use {
        errors.push(name_in_use_error(candidate.name));
    }

    if let Some(workflow) = candidate.default_workflow {
        if !workflows.exists(workflow) {
            errors.add("default_workflow", format!("workflow '{workflow}' does not exist"));
        }
    }

    for (issue_type, workflow) in candidate.mappings {
        if !issue_types.exists(issue_type) {
            errors.add("mappings", format!("issue type '{issue_type}' does not exist"));
        }
        if !workflows.exists(workflow) {
            errors.add("mappings", format!("workflow '{workflow}' does not exist"));
        }
    }

    errors
}
