//! Implementación Postgres (Diesel) del trait `SchemeRepository` del core.
//!
//! Objetivo del módulo:
//! - Responder el contrato del repositorio igual que el backend en memoria,
//!   sólo que durable: mismas variantes de `StoreError`, misma semántica del
//!   espacio de borradores.
//! - Dejar en la base la única regla que el almacenamiento conoce (unicidad
//!   de nombre de la capa activa): índice único, y la violación se traduce a
//!   `StoreError::DuplicateName`.
//! - Que ninguna fila de DB se asome fuera de este módulo.
//!
//! Decisiones:
//! - Cada operación es una transacción read-modify-write acotada; el motor
//!   no mantiene estado entre llamadas.
//! - El borrador vive en su propia tabla, clavado al padre por FK con
//!   `ON DELETE CASCADE`: borrar el esquema arrastra su borrador.
//! - Los errores transitorios se reintentan con un backoff corto.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use serde_json::Value;
use uuid::Uuid;

use log::{debug, warn};
use track_core::{SchemeRepository, StoreError};
use track_domain::{DraftScheme, IssueTypeMappings, SchemeId, WorkflowScheme};

use crate::config::DbConfig;
use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{workflow_scheme_drafts, workflow_schemes};

/// Pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Fuente de conexiones del repositorio.
///
/// El repositorio no conoce el pool: pide conexiones a través de este trait,
/// así un test unitario puede sustituirlo sin levantar r2d2.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

/// Fuente respaldada por un `PgPool` real.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Construye el pool desde el entorno (`DATABASE_URL`) y aplica las
/// migraciones pendientes antes de entregar la primera conexión.
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    let cfg = DbConfig::from_env();
    let manager = ConnectionManager::<PgConnection>::new(cfg.url);
    let pool = r2d2::Pool::builder()
        .min_idle(Some(cfg.min_connections))
        .max_size(cfg.max_connections)
        .build(manager)
        .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    let mut conn = pool.get()
        .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))?;
    run_pending_migrations(&mut conn)?;
    Ok(pool)
}

/// Fila de `workflow_schemes` para lecturas.
#[derive(Queryable, Debug)]
pub struct SchemeRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub default_workflow: Option<String>,
    pub mappings: Value,
    pub last_modified: DateTime<Utc>,
    pub last_modified_user: String,
}

/// Fila de `workflow_schemes` para inserciones.
#[derive(Insertable, Debug)]
#[diesel(table_name = workflow_schemes)]
pub struct NewSchemeRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub default_workflow: Option<String>,
    pub mappings: Value,
    pub last_modified: DateTime<Utc>,
    pub last_modified_user: String,
}

/// Fila de `workflow_scheme_drafts` para lecturas.
#[derive(Queryable, Debug)]
pub struct DraftRow {
    pub parent_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub default_workflow: Option<String>,
    pub mappings: Value,
    pub last_modified: DateTime<Utc>,
    pub last_modified_user: String,
}

/// Fila de `workflow_scheme_drafts` para inserciones.
#[derive(Insertable, Debug)]
#[diesel(table_name = workflow_scheme_drafts)]
pub struct NewDraftRow {
    pub parent_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub default_workflow: Option<String>,
    pub mappings: Value,
    pub last_modified: DateTime<Utc>,
    pub last_modified_user: String,
}

const RETRY_ATTEMPTS: u64 = 3;

/// Mensajes que el driver entrega como `Unknown` pero que en la práctica son
/// transitorios; se comparan por texto para no acoplarse a SQLSTATE.
const TRANSIENT_FRAGMENTS: &[&str] = &["deadlock detected",
                                       "could not serialize access due to concurrent update",
                                       "connection closed",
                                       "connection refused",
                                       "timeout"];

fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict | PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let msg = msg.to_lowercase();
            TRANSIENT_FRAGMENTS.iter().any(|fragment| msg.contains(fragment))
        }
        _ => false,
    }
}

/// Reintenta errores transitorios con un backoff lineal corto.
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempt = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempt < RETRY_ATTEMPTS => {
                attempt += 1;
                let delay = std::time::Duration::from_millis(15 * attempt);
                warn!("retrying after transient error (attempt {attempt}): {e:?}");
                std::thread::sleep(delay);
            }
            r => return r,
        }
    }
}

fn mappings_to_value(mappings: &IssueTypeMappings) -> Result<Value, PersistenceError> {
    serde_json::to_value(mappings).map_err(|e| PersistenceError::Unknown(format!("serialize mappings: {e}")))
}

fn value_to_mappings(value: Value) -> Result<IssueTypeMappings, PersistenceError> {
    serde_json::from_value(value).map_err(|e| PersistenceError::Unknown(format!("deserialize mappings: {e}")))
}

fn row_to_scheme(row: SchemeRow) -> Result<WorkflowScheme, PersistenceError> {
    Ok(WorkflowScheme { id: row.id,
                        name: row.name,
                        description: row.description,
                        default_workflow: row.default_workflow,
                        mappings: value_to_mappings(row.mappings)?,
                        last_modified: row.last_modified,
                        last_modified_user: row.last_modified_user })
}

fn row_to_draft(row: DraftRow) -> Result<DraftScheme, PersistenceError> {
    Ok(DraftScheme { parent_id: row.parent_id,
                     scheme: WorkflowScheme { id: row.parent_id,
                                              name: row.name,
                                              description: row.description,
                                              default_workflow: row.default_workflow,
                                              mappings: value_to_mappings(row.mappings)?,
                                              last_modified: row.last_modified,
                                              last_modified_user: row.last_modified_user } })
}

/// Errores genéricos de la capa: todo lo que no tiene traducción semántica
/// termina como `Backend` con el mensaje original.
fn store_err(e: PersistenceError) -> StoreError {
    match e {
        PersistenceError::NotFound => StoreError::NotFound,
        other => StoreError::Backend(other.to_string()),
    }
}

/// Repositorio de esquemas sobre Postgres.
pub struct PgSchemeRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgSchemeRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl PgSchemeRepository<PoolProvider> {
    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(PoolProvider { pool })
    }
}

impl<P: ConnectionProvider> SchemeRepository for PgSchemeRepository<P> {
    fn create(&self, scheme: WorkflowScheme) -> Result<(), StoreError> {
        debug!("create scheme id={} name={}", scheme.id, scheme.name);
        let result = with_retry(|| {
            let row = NewSchemeRow { id: scheme.id,
                                     name: scheme.name.clone(),
                                     description: scheme.description.clone(),
                                     default_workflow: scheme.default_workflow.clone(),
                                     mappings: mappings_to_value(&scheme.mappings)?,
                                     last_modified: scheme.last_modified,
                                     last_modified_user: scheme.last_modified_user.clone() };
            let mut conn = self.provider.connection()?;
            diesel::insert_into(workflow_schemes::table)
                .values(&row)
                .execute(&mut conn)
                .map_err(PersistenceError::from)?;
            Ok(())
        });
        match result {
            Ok(()) => Ok(()),
            Err(PersistenceError::UniqueViolation(_)) => Err(StoreError::DuplicateName(scheme.name)),
            Err(e) => Err(store_err(e)),
        }
    }

    fn get(&self, id: SchemeId) -> Result<WorkflowScheme, StoreError> {
        let row = with_retry(|| {
            let mut conn = self.provider.connection()?;
            workflow_schemes::table.find(id)
                                   .first::<SchemeRow>(&mut conn)
                                   .optional()
                                   .map_err(PersistenceError::from)
        }).map_err(store_err)?;
        match row {
            Some(row) => row_to_scheme(row).map_err(store_err),
            None => Err(StoreError::NotFound),
        }
    }

    fn update(&self, scheme: WorkflowScheme) -> Result<(), StoreError> {
        let result = with_retry(|| {
            let mappings = mappings_to_value(&scheme.mappings)?;
            let mut conn = self.provider.connection()?;
            diesel::update(workflow_schemes::table.find(scheme.id))
                .set((workflow_schemes::name.eq(scheme.name.clone()),
                      workflow_schemes::description.eq(scheme.description.clone()),
                      workflow_schemes::default_workflow.eq(scheme.default_workflow.clone()),
                      workflow_schemes::mappings.eq(mappings),
                      workflow_schemes::last_modified.eq(scheme.last_modified),
                      workflow_schemes::last_modified_user.eq(scheme.last_modified_user.clone())))
                .execute(&mut conn)
                .map_err(PersistenceError::from)
        });
        match result {
            Ok(0) => Err(StoreError::NotFound),
            Ok(_) => Ok(()),
            Err(PersistenceError::UniqueViolation(_)) => Err(StoreError::DuplicateName(scheme.name)),
            Err(e) => Err(store_err(e)),
        }
    }

    fn delete(&self, id: SchemeId) -> Result<(), StoreError> {
        debug!("delete scheme id={id}");
        // la FK con ON DELETE CASCADE arrastra el borrador
        let deleted = with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::delete(workflow_schemes::table.find(id))
                .execute(&mut conn)
                .map_err(PersistenceError::from)
        }).map_err(store_err)?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn get_draft(&self, id: SchemeId) -> Result<DraftScheme, StoreError> {
        let row = with_retry(|| {
            let mut conn = self.provider.connection()?;
            workflow_scheme_drafts::table.find(id)
                                         .first::<DraftRow>(&mut conn)
                                         .optional()
                                         .map_err(PersistenceError::from)
        }).map_err(store_err)?;
        match row {
            Some(row) => row_to_draft(row).map_err(store_err),
            None => Err(StoreError::DraftNotFound),
        }
    }

    fn put_draft(&self, draft: DraftScheme) -> Result<(), StoreError> {
        let result = with_retry(|| {
            let row = NewDraftRow { parent_id: draft.parent_id,
                                    name: draft.scheme.name.clone(),
                                    description: draft.scheme.description.clone(),
                                    default_workflow: draft.scheme.default_workflow.clone(),
                                    mappings: mappings_to_value(&draft.scheme.mappings)?,
                                    last_modified: draft.scheme.last_modified,
                                    last_modified_user: draft.scheme.last_modified_user.clone() };
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx_conn| -> Result<(), PersistenceError> {
                    diesel::delete(workflow_scheme_drafts::table.find(draft.parent_id))
                        .execute(tx_conn)?;
                    diesel::insert_into(workflow_scheme_drafts::table)
                        .values(&row)
                        .execute(tx_conn)?;
                    Ok(())
                })
        });
        match result {
            Ok(()) => Ok(()),
            // sin fila padre no hay borrador válido
            Err(PersistenceError::ForeignKeyViolation(_)) => Err(StoreError::NotFound),
            Err(e) => Err(store_err(e)),
        }
    }

    fn delete_draft(&self, id: SchemeId) -> Result<(), StoreError> {
        // idempotente: cero filas borradas no es un error
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::delete(workflow_scheme_drafts::table.find(id))
                .execute(&mut conn)
                .map_err(PersistenceError::from)
        }).map_err(store_err)?;
        Ok(())
    }

    fn find_id_by_name(&self, name: &str) -> Result<Option<SchemeId>, StoreError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            workflow_schemes::table.filter(workflow_schemes::name.eq(name))
                                   .select(workflow_schemes::id)
                                   .first::<Uuid>(&mut conn)
                                   .optional()
                                   .map_err(PersistenceError::from)
        }).map_err(store_err)
    }
}
