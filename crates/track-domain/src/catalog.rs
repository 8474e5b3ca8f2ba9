//! Catálogos de referencia consultados por la validación.
//!
//! Son colaboradores externos al motor: el catálogo de workflows y el de
//! tipos de issue viven en otros subsistemas y aquí sólo se consumen como
//! predicados de existencia.

/// Workflow de respaldo del sistema. Un esquema sin default explícito
/// resuelve a este nombre en lectura; nunca se observa un default vacío.
pub const SYSTEM_DEFAULT_WORKFLOW: &str = "default";

/// Catálogo de workflows reconocidos por el sistema.
pub trait WorkflowCatalog: Send + Sync {
    fn exists(&self, name: &str) -> bool;
}

/// Catálogo de tipos de issue válidos como clave de mapeo.
pub trait IssueTypeCatalog: Send + Sync {
    fn exists(&self, id: &str) -> bool;
    fn all(&self) -> Vec<String>;
}
