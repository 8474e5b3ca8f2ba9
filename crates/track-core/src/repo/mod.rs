pub mod types;
pub use types::{InMemorySchemeRepository, SchemeRepository};
