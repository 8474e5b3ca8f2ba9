//! Límite de persistencia de esquemas: capa activa más, opcionalmente, un
//! borrador por esquema, direccionado por el mismo id en un espacio propio.
//!
//! Aquí no vive lógica de negocio. La única regla que el almacenamiento
//! conoce es la unicidad de nombre de la capa activa, porque es quien puede
//! garantizarla de forma atómica.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use track_domain::{DraftScheme, SchemeId, WorkflowScheme};

use crate::errors::StoreError;

pub trait SchemeRepository: Send + Sync {
    /// Alta de la capa activa. Falla con `DuplicateName` si el nombre ya
    /// pertenece a otro esquema activo.
    fn create(&self, scheme: WorkflowScheme) -> Result<(), StoreError>;
    fn get(&self, id: SchemeId) -> Result<WorkflowScheme, StoreError>;
    /// Reemplaza la capa activa completa del esquema (mismo id).
    fn update(&self, scheme: WorkflowScheme) -> Result<(), StoreError>;
    /// Borra el esquema y cualquier borrador que cuelgue de él.
    fn delete(&self, id: SchemeId) -> Result<(), StoreError>;
    fn get_draft(&self, id: SchemeId) -> Result<DraftScheme, StoreError>;
    /// Crea o reemplaza el borrador del esquema padre.
    fn put_draft(&self, draft: DraftScheme) -> Result<(), StoreError>;
    /// Idempotente: descartar un borrador inexistente no es un error.
    fn delete_draft(&self, id: SchemeId) -> Result<(), StoreError>;
    /// Dueño del nombre en la capa activa, si lo hay.
    fn find_id_by_name(&self, name: &str) -> Result<Option<SchemeId>, StoreError>;
}

struct SchemeRecord {
    active: WorkflowScheme,
    draft: Option<DraftScheme>,
}

/// Backend en memoria. Un registro por esquema (activa + borrador opcional)
/// y un índice de nombres para detectar duplicados de forma atómica.
pub struct InMemorySchemeRepository {
    records: DashMap<SchemeId, SchemeRecord>,
    names: DashMap<String, SchemeId>,
}

impl InMemorySchemeRepository {
    pub fn new() -> Self {
        Self { records: DashMap::new(), names: DashMap::new() }
    }
}

impl Default for InMemorySchemeRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemeRepository for InMemorySchemeRepository {
    fn create(&self, scheme: WorkflowScheme) -> Result<(), StoreError> {
        // reclamar el nombre primero; el guard del entry se suelta antes de
        // tocar el mapa de registros (nunca se sostienen ambos shards)
        match self.names.entry(scheme.name.clone()) {
            Entry::Occupied(_) => return Err(StoreError::DuplicateName(scheme.name)),
            Entry::Vacant(slot) => {
                slot.insert(scheme.id);
            }
        }
        self.records.insert(scheme.id, SchemeRecord { active: scheme, draft: None });
        Ok(())
    }

    fn get(&self, id: SchemeId) -> Result<WorkflowScheme, StoreError> {
        self.records
            .get(&id)
            .map(|r| r.active.clone())
            .ok_or(StoreError::NotFound)
    }

    fn update(&self, scheme: WorkflowScheme) -> Result<(), StoreError> {
        let old_name = {
            let record = self.records.get(&scheme.id).ok_or(StoreError::NotFound)?;
            record.active.name.clone()
        };
        if old_name != scheme.name {
            match self.names.entry(scheme.name.clone()) {
                Entry::Occupied(owner) if *owner.get() != scheme.id => {
                    return Err(StoreError::DuplicateName(scheme.name));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(scheme.id);
                }
            }
            self.names.remove_if(&old_name, |_, owner| *owner == scheme.id);
        }
        let mut record = self.records.get_mut(&scheme.id).ok_or(StoreError::NotFound)?;
        record.active = scheme;
        Ok(())
    }

    fn delete(&self, id: SchemeId) -> Result<(), StoreError> {
        let (_, record) = self.records.remove(&id).ok_or(StoreError::NotFound)?;
        self.names.remove_if(&record.active.name, |_, owner| *owner == id);
        Ok(())
    }

    fn get_draft(&self, id: SchemeId) -> Result<DraftScheme, StoreError> {
        let record = self.records.get(&id).ok_or(StoreError::NotFound)?;
        record.draft.clone().ok_or(StoreError::DraftNotFound)
    }

    fn put_draft(&self, draft: DraftScheme) -> Result<(), StoreError> {
        let mut record = self.records.get_mut(&draft.parent_id).ok_or(StoreError::NotFound)?;
        record.draft = Some(draft);
        Ok(())
    }

    fn delete_draft(&self, id: SchemeId) -> Result<(), StoreError> {
        if let Some(mut record) = self.records.get_mut(&id) {
            record.draft = None;
        }
        Ok(())
    }

    fn find_id_by_name(&self, name: &str) -> Result<Option<SchemeId>, StoreError> {
        Ok(self.names.get(name).map(|owner| *owner.value()))
    }
}
