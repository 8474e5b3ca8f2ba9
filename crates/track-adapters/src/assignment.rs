//! Registro de asignaciones proyecto -> esquema.
//!
//! El motor sólo consume el predicado de activación; el registro en sí es
//! mutable de forma externa y concurrente (un proyecto puede cambiar de
//! esquema en cualquier momento), por eso se comparte por clonación barata.

use std::sync::Arc;

use dashmap::DashMap;
use track_core::ActivationOracle;
use track_domain::SchemeId;

#[derive(Clone, Default)]
pub struct ProjectAssignmentRegistry {
    assignments: Arc<DashMap<String, SchemeId>>,
}

impl ProjectAssignmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asigna el esquema al proyecto, reemplazando la asignación previa.
    pub fn assign(&self, project_key: &str, scheme_id: SchemeId) {
        self.assignments.insert(project_key.to_string(), scheme_id);
    }

    pub fn unassign(&self, project_key: &str) {
        self.assignments.remove(project_key);
    }

    pub fn scheme_for(&self, project_key: &str) -> Option<SchemeId> {
        self.assignments.get(project_key).map(|entry| *entry.value())
    }

    pub fn projects_using(&self, scheme_id: SchemeId) -> Vec<String> {
        self.assignments
            .iter()
            .filter(|entry| *entry.value() == scheme_id)
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl ActivationOracle for ProjectAssignmentRegistry {
    fn is_active(&self, scheme_id: SchemeId) -> bool {
        self.assignments.iter().any(|entry| *entry.value() == scheme_id)
    }
}
