//! Motor de configuración de esquemas de workflows.
//!
//! Orquesta repositorio, oráculo de activación, catálogos y validación para
//! exponer el contrato público: CRUD de esquemas, ciclo de vida del borrador
//! y ediciones del mapeo y del default, todas honrando la guarda de
//! activación. La máquina de ruteo por mutación es:
//!
//! - esquema inexistente -> `SchemeNotFound`
//! - activa sin asignación de proyecto -> se muta la capa activa
//! - activa asignada -> borrador si `update_draft_if_needed`, conflicto si no
//! - con borrador -> se muta el borrador, sin importar la asignación

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use track_domain::{group_by_workflow, name_in_use_error, validate_scheme, IssueTypeCatalog,
                   IssueTypeMapping, NewScheme, SchemeCandidate, SchemeId, SchemeUpdate, SchemeView,
                   ValidationErrors, WorkflowCatalog, WorkflowMapping, WorkflowScheme};

use crate::errors::{draft_not_found, scheme_not_found, ConflictKind, SchemeEngineError, StoreError};
use crate::oracle::ActivationOracle;
use crate::overlay;
use crate::repo::SchemeRepository;

pub struct WorkflowSchemeEngine<R, A>
    where R: SchemeRepository,
          A: ActivationOracle
{
    repository: R,
    oracle: A,
    workflows: Box<dyn WorkflowCatalog>,
    issue_types: Box<dyn IssueTypeCatalog>,
    /// Sección crítica por esquema: operaciones sobre ids distintos nunca se
    /// bloquean entre sí; sobre el mismo id se serializan.
    locks: DashMap<SchemeId, Arc<Mutex<()>>>,
}

impl<R, A> WorkflowSchemeEngine<R, A>
    where R: SchemeRepository,
          A: ActivationOracle
{
    pub fn new(repository: R,
               oracle: A,
               workflows: Box<dyn WorkflowCatalog>,
               issue_types: Box<dyn IssueTypeCatalog>)
               -> Self {
        Self { repository,
               oracle,
               workflows,
               issue_types,
               locks: DashMap::new() }
    }

    /// Punto de entrada al builder (ver `engine::builder`).
    pub fn builder(repository: R, oracle: A) -> super::EngineBuilderInit<R, A> {
        super::EngineBuilderInit { repository, oracle }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    // ---------------------------------------------------------------
    // Lecturas
    // ---------------------------------------------------------------

    /// Vista del esquema: el borrador si `want_draft_if_exists` y hay uno,
    /// la capa activa en cualquier otro caso.
    pub fn get_scheme(&self, id: SchemeId, want_draft_if_exists: bool) -> Result<SchemeView, SchemeEngineError> {
        let active = self.repository.get(id).map_err(scheme_not_found)?;
        if want_draft_if_exists {
            match self.repository.get_draft(id) {
                Ok(draft) => return Ok(SchemeView::of_draft(&draft, &active)),
                Err(StoreError::DraftNotFound) | Err(StoreError::NotFound) => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(SchemeView::of_active(&active))
    }

    /// Espacio de nombres de borradores: falla con `DraftNotFound` si no hay
    /// borrador, exista o no el padre.
    pub fn get_draft_scheme(&self, id: SchemeId) -> Result<SchemeView, SchemeEngineError> {
        let draft = self.repository.get_draft(id).map_err(draft_not_found)?;
        let parent = self.repository.get(id).map_err(scheme_not_found)?;
        Ok(SchemeView::of_draft(&draft, &parent))
    }

    /// Mapeo efectivo agrupado por workflow. El default efectivo aparece
    /// siempre, aunque no tenga entradas explícitas.
    pub fn get_workflow_mappings(&self, id: SchemeId, want_draft_if_exists: bool) -> Result<Vec<WorkflowMapping>, SchemeEngineError> {
        let view = self.get_scheme(id, want_draft_if_exists)?;
        Ok(group_by_workflow(&view.mappings, view.effective_default()))
    }

    pub fn get_workflow_mapping(&self,
                                id: SchemeId,
                                workflow: &str,
                                want_draft_if_exists: bool)
                                -> Result<WorkflowMapping, SchemeEngineError> {
        let view = self.get_scheme(id, want_draft_if_exists)?;
        if !self.workflows.exists(workflow) {
            return Err(SchemeEngineError::WorkflowNotFound(workflow.to_string()));
        }
        let issue_types = view.mappings
                              .iter()
                              .filter(|(_, w)| w.as_str() == workflow)
                              .map(|(t, _)| t.clone())
                              .collect();
        Ok(WorkflowMapping { workflow: workflow.to_string(),
                             issue_types,
                             default_mapping: view.effective_default() == workflow })
    }

    /// `workflow` queda en `None` para un tipo conocido sin entrada (cae en
    /// el default del esquema).
    pub fn get_issue_type_mapping(&self,
                                  id: SchemeId,
                                  issue_type: &str,
                                  want_draft_if_exists: bool)
                                  -> Result<IssueTypeMapping, SchemeEngineError> {
        let view = self.get_scheme(id, want_draft_if_exists)?;
        if !self.issue_types.exists(issue_type) {
            return Err(SchemeEngineError::IssueTypeNotFound(issue_type.to_string()));
        }
        Ok(IssueTypeMapping { issue_type: issue_type.to_string(),
                              workflow: view.mappings.get(issue_type).cloned() })
    }

    /// Default efectivo: nunca vacío, resuelve al workflow del sistema si el
    /// esquema no tiene default explícito.
    pub fn get_default(&self, id: SchemeId, want_draft_if_exists: bool) -> Result<String, SchemeEngineError> {
        let view = self.get_scheme(id, want_draft_if_exists)?;
        Ok(view.effective_default().to_string())
    }

    // ---------------------------------------------------------------
    // Ciclo de vida del esquema
    // ---------------------------------------------------------------

    pub fn create_scheme(&self, data: NewScheme, user: &str) -> Result<SchemeView, SchemeEngineError> {
        let name_in_use = self.repository.find_id_by_name(&data.name)?.is_some();
        let candidate = SchemeCandidate { name: &data.name,
                                          default_workflow: data.default_workflow.as_deref(),
                                          mappings: &data.mappings,
                                          name_in_use };
        self.check_validation(candidate, &data.name)?;

        let mut scheme = WorkflowScheme::new(&data.name, user);
        scheme.description = data.description;
        scheme.default_workflow = data.default_workflow;
        scheme.mappings = data.mappings;
        match self.repository.create(scheme.clone()) {
            Ok(()) => Ok(SchemeView::of_active(&scheme)),
            Err(StoreError::DuplicateName(name)) => {
                Err(SchemeEngineError::Conflict(ConflictKind::DuplicateName(name)))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Actualización dispersa. Cambios de nombre/descripción sobre un esquema
    /// activo se aplican en el lugar; tocar default o mapeo pasa por la
    /// guarda de activación. La validación corre antes de cualquier escritura
    /// (un payload inválido no llega a crear el borrador).
    pub fn update_scheme(&self,
                         id: SchemeId,
                         update: SchemeUpdate,
                         update_draft_if_needed: bool,
                         user: &str)
                         -> Result<SchemeView, SchemeEngineError> {
        let handle = self.lock_handle(id);
        let _guard = handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let active = self.repository.get(id).map_err(scheme_not_found)?;
        let draft = match self.repository.get_draft(id) {
            Ok(draft) => Some(draft),
            Err(StoreError::DraftNotFound) | Err(StoreError::NotFound) => None,
            Err(err) => return Err(err.into()),
        };

        let basis = draft.as_ref().map(|d| &d.scheme).unwrap_or(&active);
        let mut candidate = basis.clone();
        update.apply_to(&mut candidate);

        let semantic_change = draft.is_none()
                              && (candidate.default_workflow != active.default_workflow
                                  || candidate.mappings != active.mappings);
        let routes_to_draft = draft.is_some() || (semantic_change && self.oracle.is_active(id));

        // el nombre de un borrador no se compara con las capas activas de
        // otros esquemas (se re-verifica al publicar); sólo una escritura
        // sobre la capa activa valida la colisión
        let name_in_use = !routes_to_draft
                          && matches!(self.repository.find_id_by_name(&candidate.name)?,
                                      Some(owner) if owner != id);
        let vc = SchemeCandidate { name: &candidate.name,
                                   default_workflow: candidate.default_workflow.as_deref(),
                                   mappings: &candidate.mappings,
                                   name_in_use };
        self.check_validation(vc, &candidate.name)?;

        match draft {
            Some(mut draft) => {
                if candidate != draft.scheme {
                    candidate.touch(user);
                    draft.scheme = candidate;
                    self.repository.put_draft(draft.clone())?;
                }
                Ok(SchemeView::of_draft(&draft, &active))
            }
            None => {
                if routes_to_draft {
                    if !update_draft_if_needed {
                        return Err(SchemeEngineError::Conflict(ConflictKind::ActiveScheme));
                    }
                    let draft = overlay::ensure_draft(&self.repository, &active, user)?;
                    let draft = overlay::apply_mutation(&self.repository, draft, user, |s| update.apply_to(s))?;
                    Ok(SchemeView::of_draft(&draft, &active))
                } else if candidate != active {
                    candidate.touch(user);
                    match self.repository.update(candidate.clone()) {
                        Ok(()) => Ok(SchemeView::of_active(&candidate)),
                        Err(StoreError::DuplicateName(name)) => {
                            Err(SchemeEngineError::Conflict(ConflictKind::DuplicateName(name)))
                        }
                        Err(err) => Err(err.into()),
                    }
                } else {
                    Ok(SchemeView::of_active(&active))
                }
            }
        }
    }

    /// Borra el esquema y su borrador. Un esquema asignado a un proyecto no
    /// se puede borrar.
    pub fn delete_scheme(&self, id: SchemeId) -> Result<(), SchemeEngineError> {
        let handle = self.lock_handle(id);
        let _guard = handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        self.repository.get(id).map_err(scheme_not_found)?;
        if self.oracle.is_active(id) {
            return Err(SchemeEngineError::Conflict(ConflictKind::ActiveSchemeDelete));
        }
        self.repository.delete(id).map_err(scheme_not_found)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Ciclo de vida del borrador
    // ---------------------------------------------------------------

    /// Creación explícita del borrador. Que ya exista uno es un conflicto.
    /// Precondición del llamador: el padre está asignado a algún proyecto
    /// (la capa de transporte no ofrece esta transición en otro caso).
    pub fn create_draft(&self, id: SchemeId, user: &str) -> Result<SchemeView, SchemeEngineError> {
        let handle = self.lock_handle(id);
        let _guard = handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let active = self.repository.get(id).map_err(scheme_not_found)?;
        let draft = overlay::create_draft(&self.repository, &active, user)?;
        Ok(SchemeView::of_draft(&draft, &active))
    }

    pub fn discard_draft(&self, id: SchemeId) -> Result<(), SchemeEngineError> {
        let handle = self.lock_handle(id);
        let _guard = handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        self.repository.get(id).map_err(scheme_not_found)?;
        overlay::discard(&self.repository, id)
    }

    // ---------------------------------------------------------------
    // Ediciones del mapeo y del default
    // ---------------------------------------------------------------

    /// Reemplaza el conjunto de tipos de issue mapeados a `workflow` (si se
    /// da uno) y/o ajusta el default. Con `issue_types` en `None` los mapeos
    /// del workflow no se tocan: un cambio sólo-default no reagrupa nada.
    pub fn set_workflow_mapping(&self,
                                id: SchemeId,
                                workflow: &str,
                                issue_types: Option<&[String]>,
                                set_default: Option<bool>,
                                update_draft_if_needed: bool,
                                user: &str)
                                -> Result<SchemeView, SchemeEngineError> {
        if !self.workflows.exists(workflow) {
            return Err(SchemeEngineError::WorkflowNotFound(workflow.to_string()));
        }
        if let Some(types) = issue_types {
            let mut errors = ValidationErrors::new();
            for issue_type in types {
                if !self.issue_types.exists(issue_type) {
                    errors.add("issue_types", format!("issue type '{issue_type}' does not exist"));
                }
            }
            if !errors.is_empty() {
                return Err(SchemeEngineError::Validation(errors));
            }
        }

        let workflow = workflow.to_string();
        let issue_types: Option<Vec<String>> = issue_types.map(<[String]>::to_vec);
        self.mutate(id, update_draft_if_needed, user, move |scheme| {
                if let Some(types) = &issue_types {
                    scheme.replace_workflow_issue_types(&workflow, types);
                }
                match set_default {
                    Some(true) => scheme.default_workflow = Some(workflow.clone()),
                    Some(false) => {
                        if scheme.default_workflow.as_deref() == Some(workflow.as_str()) {
                            scheme.default_workflow = None;
                        }
                    }
                    None => {}
                }
            })
    }

    /// Quita todas las entradas que apuntan a `workflow`; si era el default
    /// explícito, el default queda sin definir. Si el workflow no tenía
    /// entradas ni era default, la operación es un no-op válido.
    pub fn remove_workflow_mapping(&self,
                                   id: SchemeId,
                                   workflow: &str,
                                   update_draft_if_needed: bool,
                                   user: &str)
                                   -> Result<SchemeView, SchemeEngineError> {
        if !self.workflows.exists(workflow) {
            return Err(SchemeEngineError::WorkflowNotFound(workflow.to_string()));
        }
        let workflow = workflow.to_string();
        self.mutate(id, update_draft_if_needed, user, move |scheme| scheme.remove_workflow(&workflow))
    }

    /// Asigna o mueve un único tipo de issue a `workflow`.
    pub fn set_issue_type_mapping(&self,
                                  id: SchemeId,
                                  issue_type: &str,
                                  workflow: &str,
                                  update_draft_if_needed: bool,
                                  user: &str)
                                  -> Result<SchemeView, SchemeEngineError> {
        if !self.issue_types.exists(issue_type) {
            return Err(SchemeEngineError::IssueTypeNotFound(issue_type.to_string()));
        }
        if !self.workflows.exists(workflow) {
            let mut errors = ValidationErrors::new();
            errors.add("workflow", format!("workflow '{workflow}' does not exist"));
            return Err(SchemeEngineError::Validation(errors));
        }
        let issue_type = issue_type.to_string();
        let workflow = workflow.to_string();
        self.mutate(id, update_draft_if_needed, user, move |scheme| {
                scheme.set_issue_type(&issue_type, &workflow);
            })
    }

    /// Quita la entrada de un tipo de issue. La ausencia de la entrada no es
    /// un error: la operación es idempotente.
    pub fn remove_issue_type_mapping(&self,
                                     id: SchemeId,
                                     issue_type: &str,
                                     update_draft_if_needed: bool,
                                     user: &str)
                                     -> Result<SchemeView, SchemeEngineError> {
        if !self.issue_types.exists(issue_type) {
            return Err(SchemeEngineError::IssueTypeNotFound(issue_type.to_string()));
        }
        let issue_type = issue_type.to_string();
        self.mutate(id, update_draft_if_needed, user, move |scheme| {
                scheme.remove_issue_type(&issue_type);
            })
    }

    pub fn set_default(&self,
                       id: SchemeId,
                       workflow: &str,
                       update_draft_if_needed: bool,
                       user: &str)
                       -> Result<SchemeView, SchemeEngineError> {
        if !self.workflows.exists(workflow) {
            let mut errors = ValidationErrors::new();
            errors.add("default_workflow", format!("workflow '{workflow}' does not exist"));
            return Err(SchemeEngineError::Validation(errors));
        }
        let workflow = workflow.to_string();
        self.mutate(id, update_draft_if_needed, user, move |scheme| {
                scheme.default_workflow = Some(workflow.clone());
            })
    }

    /// Deja el default sin definir; en lectura vuelve a resolver al workflow
    /// del sistema.
    pub fn remove_default(&self,
                          id: SchemeId,
                          update_draft_if_needed: bool,
                          user: &str)
                          -> Result<SchemeView, SchemeEngineError> {
        self.mutate(id, update_draft_if_needed, user, |scheme| {
                scheme.default_workflow = None;
            })
    }

    // ---------------------------------------------------------------
    // Ruteo
    // ---------------------------------------------------------------

    /// Máquina de ruteo común a todas las ediciones de mapeo/default. El
    /// oráculo se consulta dentro de la sección crítica del id, y un no-op
    /// sobre un esquema activo se acepta sin exigir borrador.
    fn mutate<F>(&self,
                 id: SchemeId,
                 update_draft_if_needed: bool,
                 user: &str,
                 apply: F)
                 -> Result<SchemeView, SchemeEngineError>
        where F: Fn(&mut WorkflowScheme)
    {
        let handle = self.lock_handle(id);
        let _guard = handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let active = self.repository.get(id).map_err(scheme_not_found)?;
        match self.repository.get_draft(id) {
            Ok(draft) => {
                let draft = overlay::apply_mutation(&self.repository, draft, user, apply)?;
                Ok(SchemeView::of_draft(&draft, &active))
            }
            Err(StoreError::DraftNotFound) | Err(StoreError::NotFound) => {
                let mut updated = active.clone();
                apply(&mut updated);
                if updated == active {
                    return Ok(SchemeView::of_active(&active));
                }
                if self.oracle.is_active(id) {
                    if !update_draft_if_needed {
                        return Err(SchemeEngineError::Conflict(ConflictKind::ActiveScheme));
                    }
                    let draft = overlay::ensure_draft(&self.repository, &active, user)?;
                    let draft = overlay::apply_mutation(&self.repository, draft, user, &apply)?;
                    Ok(SchemeView::of_draft(&draft, &active))
                } else {
                    updated.touch(user);
                    self.repository.update(updated.clone())?;
                    Ok(SchemeView::of_active(&updated))
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Valida y traduce la colisión de nombre pura a conflicto (cuando es el
    /// único problema del candidato).
    fn check_validation(&self, candidate: SchemeCandidate<'_>, name: &str) -> Result<(), SchemeEngineError> {
        let errors = validate_scheme(&candidate, self.workflows.as_ref(), self.issue_types.as_ref());
        if errors.is_empty() {
            return Ok(());
        }
        if errors.len() == 1 && errors.first() == Some(&name_in_use_error(name)) {
            return Err(SchemeEngineError::Conflict(ConflictKind::DuplicateName(name.to_string())));
        }
        Err(SchemeEngineError::Validation(errors))
    }

    fn lock_handle(&self, id: SchemeId) -> Arc<Mutex<()>> {
        let entry = self.locks.entry(id).or_default();
        Arc::clone(entry.value())
    }
}
