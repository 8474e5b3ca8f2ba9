//! Builder del motor.
//!
//! El estado inicial exige repositorio y oráculo; los catálogos se entregan
//! en el segundo paso y producen el motor ya utilizable. Así no hay ningún
//! estado intermedio con colaboradores ausentes.

use track_domain::{IssueTypeCatalog, WorkflowCatalog};

use crate::engine::WorkflowSchemeEngine;
use crate::oracle::ActivationOracle;
use crate::repo::SchemeRepository;

/// Estado inicial del builder: stores presentes, catálogos pendientes.
pub struct EngineBuilderInit<R, A>
    where R: SchemeRepository,
          A: ActivationOracle
{
    pub repository: R,
    pub oracle: A,
}

impl<R, A> EngineBuilderInit<R, A>
    where R: SchemeRepository,
          A: ActivationOracle
{
    /// Entrega los catálogos de referencia y construye el motor.
    pub fn catalogs(self,
                    workflows: impl WorkflowCatalog + 'static,
                    issue_types: impl IssueTypeCatalog + 'static)
                    -> WorkflowSchemeEngine<R, A> {
        WorkflowSchemeEngine::new(self.repository, self.oracle, Box::new(workflows), Box::new(issue_types))
    }
}
