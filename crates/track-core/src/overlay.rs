//! Capa de borradores: copy-on-write de dos posiciones sobre el repositorio.
//!
//! Un esquema está en uno de dos estados (`Active` o `ActiveWithDraft`); el
//! borrador se crea copiando la capa activa como línea base y toda mutación
//! ruteada hacia él pasa por `apply_mutation`.

use track_domain::{DraftScheme, SchemeId, WorkflowScheme};

use crate::errors::{ConflictKind, SchemeEngineError, StoreError};
use crate::repo::SchemeRepository;

/// Devuelve el borrador existente o crea uno copiando la capa activa.
/// Idempotente: dos llamadas seguidas ven el mismo borrador.
pub(crate) fn ensure_draft<R>(repo: &R, parent: &WorkflowScheme, user: &str) -> Result<DraftScheme, SchemeEngineError>
    where R: SchemeRepository
{
    match repo.get_draft(parent.id) {
        Ok(draft) => Ok(draft),
        Err(StoreError::DraftNotFound) => {
            let draft = DraftScheme::from_active(parent, user);
            repo.put_draft(draft.clone())?;
            Ok(draft)
        }
        Err(err) => Err(err.into()),
    }
}

/// Creación explícita: a diferencia de `ensure_draft`, que ya exista un
/// borrador es un conflicto.
pub(crate) fn create_draft<R>(repo: &R, parent: &WorkflowScheme, user: &str) -> Result<DraftScheme, SchemeEngineError>
    where R: SchemeRepository
{
    match repo.get_draft(parent.id) {
        Ok(_) => Err(SchemeEngineError::Conflict(ConflictKind::DraftExists)),
        Err(StoreError::DraftNotFound) => {
            let draft = DraftScheme::from_active(parent, user);
            repo.put_draft(draft.clone())?;
            Ok(draft)
        }
        Err(err) => Err(err.into()),
    }
}

/// Descarta el borrador. Tratado como idempotente por robustez.
pub(crate) fn discard<R>(repo: &R, id: SchemeId) -> Result<(), SchemeEngineError>
    where R: SchemeRepository
{
    repo.delete_draft(id).map_err(Into::into)
}

/// Aplica una transformación pura sobre el borrador y lo re-persiste. Si la
/// transformación no cambia nada, no se escribe ni se sella la modificación.
pub(crate) fn apply_mutation<R, F>(repo: &R, mut draft: DraftScheme, user: &str, apply: F) -> Result<DraftScheme, SchemeEngineError>
    where R: SchemeRepository,
          F: Fn(&mut WorkflowScheme)
{
    let mut updated = draft.scheme.clone();
    apply(&mut updated);
    if updated != draft.scheme {
        updated.touch(user);
        draft.scheme = updated;
        repo.put_draft(draft.clone())?;
    }
    Ok(draft)
}
