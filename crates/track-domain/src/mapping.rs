//! Vistas agrupadas del mapeo de un esquema, orientadas a lectura.

use serde::{Deserialize, Serialize};

use crate::scheme::IssueTypeMappings;

/// Mapeo visto desde un workflow: los tipos de issue que apuntan a él y si
/// además es el default efectivo del esquema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowMapping {
    pub workflow: String,
    pub issue_types: Vec<String>,
    pub default_mapping: bool,
}

/// Mapeo visto desde un tipo de issue. `workflow` es `None` cuando el tipo
/// es conocido pero no tiene entrada explícita (cae en el default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTypeMapping {
    pub issue_type: String,
    pub workflow: Option<String>,
}

/// Agrupa el mapeo plano por workflow, en orden de primera aparición. El
/// default efectivo siempre aparece, aunque no tenga entradas explícitas.
pub fn group_by_workflow(mappings: &IssueTypeMappings, effective_default: &str) -> Vec<WorkflowMapping> {
    let mut grouped: Vec<WorkflowMapping> = Vec::new();
    for (issue_type, workflow) in mappings {
        match grouped.iter_mut().find(|g| g.workflow == *workflow) {
            Some(entry) => entry.issue_types.push(issue_type.clone()),
            None => grouped.push(WorkflowMapping { workflow: workflow.clone(),
                                                   issue_types: vec![issue_type.clone()],
                                                   default_mapping: workflow == effective_default }),
        }
    }
    if !grouped.iter().any(|g| g.workflow == effective_default) {
        grouped.push(WorkflowMapping { workflow: effective_default.to_string(),
                                       issue_types: Vec::new(),
                                       default_mapping: true });
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_workflow_and_flags_default() {
        let mut mappings = IssueTypeMappings::new();
        mappings.insert("bug".to_string(), "Two".to_string());
        mappings.insert("task".to_string(), "Two".to_string());
        mappings.insert("feature".to_string(), "Three".to_string());

        let grouped = group_by_workflow(&mappings, "One");
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].workflow, "Two");
        assert_eq!(grouped[0].issue_types, vec!["bug", "task"]);
        assert!(!grouped[0].default_mapping);
        // el default efectivo se lista aunque no tenga entradas
        assert_eq!(grouped[2].workflow, "One");
        assert!(grouped[2].issue_types.is_empty());
        assert!(grouped[2].default_mapping);
    }

    #[test]
    fn default_with_explicit_entries_is_not_duplicated() {
        let mut mappings = IssueTypeMappings::new();
        mappings.insert("bug".to_string(), "One".to_string());

        let grouped = group_by_workflow(&mappings, "One");
        assert_eq!(grouped.len(), 1);
        assert!(grouped[0].default_mapping);
        assert_eq!(grouped[0].issue_types, vec!["bug"]);
    }
}
