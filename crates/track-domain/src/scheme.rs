use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::SYSTEM_DEFAULT_WORKFLOW;

pub type SchemeId = Uuid;

/// Mapeo tipo de issue -> nombre de workflow. Las claves son únicas; el orden
/// de inserción se conserva sólo para producir salidas reproducibles, no es
/// parte del contrato.
pub type IssueTypeMappings = IndexMap<String, String>;

/// Capa activa de un esquema de workflows: la configuración que los proyectos
/// asignados consumen en producción.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowScheme {
    pub id: SchemeId,
    pub name: String,
    pub description: Option<String>,
    /// Default explícito; `None` resuelve al workflow del sistema en lectura.
    pub default_workflow: Option<String>,
    pub mappings: IssueTypeMappings,
    pub last_modified: DateTime<Utc>,
    pub last_modified_user: String,
}

impl WorkflowScheme {
    pub fn new(name: &str, user: &str) -> Self {
        Self { id: Uuid::new_v4(),
               name: name.to_string(),
               description: None,
               default_workflow: None,
               mappings: IssueTypeMappings::new(),
               last_modified: Utc::now(),
               last_modified_user: user.to_string() }
    }

    /// Default efectivo: el explícito si existe, o el workflow del sistema.
    pub fn effective_default(&self) -> &str {
        self.default_workflow.as_deref().unwrap_or(SYSTEM_DEFAULT_WORKFLOW)
    }

    pub fn workflow_for(&self, issue_type: &str) -> Option<&str> {
        self.mappings.get(issue_type).map(String::as_str)
    }

    /// Tipos de issue mapeados (explícitamente) al workflow dado.
    pub fn issue_types_for(&self, workflow: &str) -> Vec<String> {
        self.mappings
            .iter()
            .filter(|(_, w)| w.as_str() == workflow)
            .map(|(t, _)| t.clone())
            .collect()
    }

    pub fn set_issue_type(&mut self, issue_type: &str, workflow: &str) {
        self.mappings.insert(issue_type.to_string(), workflow.to_string());
    }

    /// Elimina la entrada de un tipo de issue. Devuelve `false` si no existía
    /// (la ausencia no es un error: la operación es idempotente).
    pub fn remove_issue_type(&mut self, issue_type: &str) -> bool {
        self.mappings.shift_remove(issue_type).is_some()
    }

    /// Reemplaza por completo el conjunto de tipos de issue mapeados a
    /// `workflow`: las entradas previas que apuntaban a él se eliminan y los
    /// tipos dados se (re)asignan, moviéndolos desde su workflow anterior.
    pub fn replace_workflow_issue_types(&mut self, workflow: &str, issue_types: &[String]) {
        self.mappings.retain(|_, w| w.as_str() != workflow);
        for issue_type in issue_types {
            self.mappings.insert(issue_type.clone(), workflow.to_string());
        }
    }

    /// Elimina todas las entradas que apuntan a `workflow`. Si ese workflow
    /// era el default explícito, el default pasa a no estar definido (y en
    /// lectura vuelve a resolver al workflow del sistema).
    pub fn remove_workflow(&mut self, workflow: &str) {
        self.mappings.retain(|_, w| w.as_str() != workflow);
        if self.default_workflow.as_deref() == Some(workflow) {
            self.default_workflow = None;
        }
    }

    /// Sella la mutación con usuario y timestamp.
    pub fn touch(&mut self, user: &str) {
        self.last_modified = Utc::now();
        self.last_modified_user = user.to_string();
    }
}

/// Borrador de un esquema activo: cambios propuestos, aún no publicados,
/// con la misma forma que la capa activa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftScheme {
    /// Esquema activo del que deriva este borrador.
    pub parent_id: SchemeId,
    pub scheme: WorkflowScheme,
}

impl DraftScheme {
    /// Crea el borrador copiando la capa activa como línea base. Un default
    /// sin definir se hereda sin definir (no se materializa el sentinel).
    pub fn from_active(parent: &WorkflowScheme, user: &str) -> Self {
        let mut scheme = parent.clone();
        scheme.touch(user);
        Self { parent_id: parent.id, scheme }
    }
}

/// Vista de lectura de un esquema: la capa efectiva más la contabilidad
/// `original_*`, calculada en el borde de lectura cuando la vista es un
/// borrador (nunca se almacena).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeView {
    pub id: SchemeId,
    pub name: String,
    pub description: Option<String>,
    pub default_workflow: Option<String>,
    pub mappings: IssueTypeMappings,
    pub draft: bool,
    pub original_default_workflow: Option<String>,
    pub original_mappings: Option<IssueTypeMappings>,
    pub last_modified: DateTime<Utc>,
    pub last_modified_user: String,
}

impl SchemeView {
    pub fn of_active(scheme: &WorkflowScheme) -> Self {
        Self { id: scheme.id,
               name: scheme.name.clone(),
               description: scheme.description.clone(),
               default_workflow: scheme.default_workflow.clone(),
               mappings: scheme.mappings.clone(),
               draft: false,
               original_default_workflow: None,
               original_mappings: None,
               last_modified: scheme.last_modified,
               last_modified_user: scheme.last_modified_user.clone() }
    }

    pub fn of_draft(draft: &DraftScheme, parent: &WorkflowScheme) -> Self {
        Self { id: draft.scheme.id,
               name: draft.scheme.name.clone(),
               description: draft.scheme.description.clone(),
               default_workflow: draft.scheme.default_workflow.clone(),
               mappings: draft.scheme.mappings.clone(),
               draft: true,
               original_default_workflow: parent.default_workflow.clone(),
               original_mappings: Some(parent.mappings.clone()),
               last_modified: draft.scheme.last_modified,
               last_modified_user: draft.scheme.last_modified_user.clone() }
    }

    pub fn effective_default(&self) -> &str {
        self.default_workflow.as_deref().unwrap_or(SYSTEM_DEFAULT_WORKFLOW)
    }
}

/// Datos de alta de un esquema nuevo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewScheme {
    pub name: String,
    pub description: Option<String>,
    pub default_workflow: Option<String>,
    pub mappings: IssueTypeMappings,
}

impl NewScheme {
    pub fn named(name: &str) -> Self {
        Self { name: name.to_string(), ..Self::default() }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_default(mut self, workflow: &str) -> Self {
        self.default_workflow = Some(workflow.to_string());
        self
    }

    pub fn with_mapping(mut self, issue_type: &str, workflow: &str) -> Self {
        self.mappings.insert(issue_type.to_string(), workflow.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme() -> WorkflowScheme {
        let mut s = WorkflowScheme::new("Dev scheme", "admin");
        s.default_workflow = Some("One".to_string());
        s.set_issue_type("bug", "Two");
        s.set_issue_type("task", "Two");
        s.set_issue_type("feature", "Three");
        s
    }

    #[test]
    fn effective_default_falls_back_to_system_workflow() {
        let mut s = scheme();
        assert_eq!(s.effective_default(), "One");
        s.default_workflow = None;
        assert_eq!(s.effective_default(), SYSTEM_DEFAULT_WORKFLOW);
    }

    #[test]
    fn remove_workflow_clears_entries_and_default() {
        let mut s = scheme();
        s.default_workflow = Some("Two".to_string());
        s.remove_workflow("Two");
        assert!(s.workflow_for("bug").is_none());
        assert!(s.workflow_for("task").is_none());
        assert_eq!(s.workflow_for("feature"), Some("Three"));
        assert!(s.default_workflow.is_none());
    }

    #[test]
    fn replace_workflow_issue_types_moves_entries() {
        let mut s = scheme();
        // "Two" pasa de {bug, task} a {task, feature}
        s.replace_workflow_issue_types("Two", &["task".to_string(), "feature".to_string()]);
        assert!(s.workflow_for("bug").is_none());
        assert_eq!(s.workflow_for("task"), Some("Two"));
        assert_eq!(s.workflow_for("feature"), Some("Two"));
        // "feature" conserva su posición original en el mapeo al ser movido
        assert_eq!(s.issue_types_for("Two"), vec!["feature".to_string(), "task".to_string()]);
        assert!(s.issue_types_for("Three").is_empty());
    }

    #[test]
    fn remove_issue_type_is_idempotent() {
        let mut s = scheme();
        assert!(s.remove_issue_type("bug"));
        assert!(!s.remove_issue_type("bug"));
    }

    #[test]
    fn draft_baseline_inherits_unset_default() {
        let mut s = scheme();
        s.default_workflow = None;
        let draft = DraftScheme::from_active(&s, "admin");
        assert!(draft.scheme.default_workflow.is_none());
        let view = SchemeView::of_draft(&draft, &s);
        assert!(view.draft);
        assert!(view.original_default_workflow.is_none());
        assert_eq!(view.effective_default(), SYSTEM_DEFAULT_WORKFLOW);
    }
}
