//! Predicado de activación, consumido como colaborador externo.

use track_domain::SchemeId;

/// ¿Está el esquema asignado al menos a un proyecto?
///
/// La asignación proyecto -> esquema muta fuera del motor, así que el
/// predicado debe consultarse fresco dentro de la misma sección crítica que
/// la decisión de ruteo; una lectura vieja podría enviar la mutación a la
/// capa equivocada.
pub trait ActivationOracle: Send + Sync {
    fn is_active(&self, scheme_id: SchemeId) -> bool;
}
