//! Catálogos en memoria, de sólo lectura una vez sembrados.

use std::collections::HashSet;

use track_domain::{IssueTypeCatalog, WorkflowCatalog, SYSTEM_DEFAULT_WORKFLOW};

/// Catálogo de workflows sembrado al construir. El workflow del sistema se
/// incluye siempre: el default efectivo de cualquier esquema debe resolver a
/// un workflow reconocido.
pub struct StaticWorkflowCatalog {
    names: HashSet<String>,
}

impl StaticWorkflowCatalog {
    pub fn new<I, S>(names: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        let mut set: HashSet<String> = names.into_iter().map(Into::into).collect();
        set.insert(SYSTEM_DEFAULT_WORKFLOW.to_string());
        Self { names: set }
    }
}

impl WorkflowCatalog for StaticWorkflowCatalog {
    fn exists(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Catálogo de tipos de issue sembrado al construir.
pub struct StaticIssueTypeCatalog {
    ids: Vec<String>,
}

impl StaticIssueTypeCatalog {
    pub fn new<I, S>(ids: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { ids: ids.into_iter().map(Into::into).collect() }
    }
}

impl IssueTypeCatalog for StaticIssueTypeCatalog {
    fn exists(&self, id: &str) -> bool {
        self.ids.iter().any(|t| t == id)
    }

    fn all(&self) -> Vec<String> {
        self.ids.clone()
    }
}
