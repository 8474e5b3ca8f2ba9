//! Traducción de errores Diesel a las variantes que esta capa distingue.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Índice único violado. En esta base sólo hay uno: el nombre del
    /// esquema en la capa activa.
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    /// FK violada: un borrador sin fila padre.
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("row not found")]
    NotFound,
    /// Conflicto de serialización entre transacciones concurrentes.
    #[error("serialization conflict")]
    SerializationConflict,
    /// Fallo de conexión o de pool, en principio transitorio.
    #[error("transient io: {0}")]
    TransientIo(String),
    #[error("database error: {0}")]
    Unknown(String),
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::UniqueViolation(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Self::ForeignKeyViolation(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                Self::CheckViolation(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
                Self::SerializationConflict
            }
            DieselError::DatabaseError(kind, info) => {
                Self::Unknown(format!("{kind:?}: {}", info.message()))
            }
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            other => Self::Unknown(other.to_string()),
        }
    }
}
