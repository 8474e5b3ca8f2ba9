//! track-persistence
//!
//! Implementación Postgres (Diesel) del límite de persistencia del motor.
//! Objetivo: paridad 1:1 con el backend en memoria de `track-core`: mismas
//! respuestas del trait `SchemeRepository`, misma semántica de unicidad de
//! nombre y de espacio de borradores, sólo que durable.
//!
//! Módulos:
//! - `pg`: el repositorio sobre Postgres (tabla de esquemas + tabla de
//!   borradores).
//! - `migrations`: migraciones Diesel embebidas en el binario.
//! - `config`: `DATABASE_URL` y límites de pool desde el entorno.
//! - `schema`: las tablas Diesel, declaradas a mano.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::init_dotenv;
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, ConnectionProvider, PgPool, PgSchemeRepository, PoolProvider};
