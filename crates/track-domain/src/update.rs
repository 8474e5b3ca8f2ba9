//! Actualización parcial de un esquema.
//!
//! El payload es disperso: sólo los campos presentes se tocan. Para poder
//! distinguir "limpia este campo" de "no lo menciones" cada campo opcional
//! se envuelve en un marcador explícito (`Patch`), en lugar de apoyarse en
//! `None` con doble significado.

use serde::{Deserialize, Serialize};

use crate::scheme::{IssueTypeMappings, WorkflowScheme};

/// Marcador de tres estados para un campo opcional de una actualización.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Patch<T> {
    /// El campo no viene en el payload: se deja como está.
    #[default]
    Keep,
    /// El campo viene explícitamente vacío: se limpia.
    Clear,
    /// El campo viene con valor: se reemplaza.
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    /// Valor propuesto, si el patch lo trae.
    pub fn proposed(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            _ => None,
        }
    }

    pub fn apply_to(&self, target: &mut Option<T>)
        where T: Clone
    {
        match self {
            Patch::Keep => {}
            Patch::Clear => *target = None,
            Patch::Set(value) => *target = Some(value.clone()),
        }
    }
}

/// Actualización dispersa de un esquema. `name` no es limpiable (un esquema
/// siempre tiene nombre), por eso no usa `Patch`. Cuando `mappings` viene,
/// reemplaza la tabla completa.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemeUpdate {
    pub name: Option<String>,
    pub description: Patch<String>,
    pub default_workflow: Patch<String>,
    pub mappings: Option<IssueTypeMappings>,
}

impl SchemeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Patch::Set(description.to_string());
        self
    }

    pub fn clear_description(mut self) -> Self {
        self.description = Patch::Clear;
        self
    }

    pub fn with_default(mut self, workflow: &str) -> Self {
        self.default_workflow = Patch::Set(workflow.to_string());
        self
    }

    pub fn clear_default(mut self) -> Self {
        self.default_workflow = Patch::Clear;
        self
    }

    pub fn with_mappings(mut self, mappings: IssueTypeMappings) -> Self {
        self.mappings = Some(mappings);
        self
    }

    pub fn with_mapping(mut self, issue_type: &str, workflow: &str) -> Self {
        self.mappings
            .get_or_insert_with(IssueTypeMappings::new)
            .insert(issue_type.to_string(), workflow.to_string());
        self
    }

    /// Una actualización toca la semántica del esquema cuando menciona el
    /// default o el mapeo; nombre y descripción son campos cosméticos y no
    /// pasan por la guarda de activación.
    pub fn touches_semantics(&self) -> bool {
        !self.default_workflow.is_keep() || self.mappings.is_some()
    }

    /// Aplica los campos presentes sobre `scheme`, dejando el resto intacto.
    pub fn apply_to(&self, scheme: &mut WorkflowScheme) {
        if let Some(name) = &self.name {
            scheme.name = name.clone();
        }
        self.description.apply_to(&mut scheme.description);
        self.default_workflow.apply_to(&mut scheme.default_workflow);
        if let Some(mappings) = &self.mappings {
            scheme.mappings = mappings.clone();
        }
    }
}
