//! Configuración de la conexión a la base de esquemas.
//!
//! Convención `DATABASE_URL` (vía `.env` si existe) más límites de pool
//! opcionales. El archivo `.env` se lee una sola vez, al primer acceso.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

static ENV_FILE: Lazy<()> = Lazy::new(|| {
    // sin .env no pasa nada: las variables pueden venir del entorno real
    let _ = dotenv();
});

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    /// Lee la configuración del entorno. `DATABASE_URL` es obligatoria; los
    /// límites del pool tienen defaults pensados para desarrollo.
    pub fn from_env() -> Self {
        Lazy::force(&ENV_FILE);
        Self { url: env::var("DATABASE_URL").expect("DATABASE_URL is not set"),
               min_connections: env_u32("DATABASE_MIN_CONNECTIONS", 2),
               max_connections: env_u32("DATABASE_MAX_CONNECTIONS", 16) }
    }
}

fn env_u32(key: &str, fallback: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(fallback)
}

/// Carga `.env` por adelantado, para quien prefiera forzarla al arrancar.
pub fn init_dotenv() {
    Lazy::force(&ENV_FILE);
}
