//! Runner de migraciones embebidas.
//!
//! Las migraciones del directorio `migrations/` de este crate viajan dentro
//! del binario y se aplican al construir el pool, antes de servir conexiones.

use diesel::pg::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::PersistenceError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn run_pending_migrations(conn: &mut PgConnection) -> Result<(), PersistenceError> {
    conn.run_pending_migrations(MIGRATIONS)
        .map(|applied| {
            if !applied.is_empty() {
                log::info!("applied {} pending migration(s)", applied.len());
            }
        })
        .map_err(|e| PersistenceError::Unknown(format!("migrations: {e}")))
}
