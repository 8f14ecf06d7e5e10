mod csv_file;
mod error;


pub use csv_file::{read_registry, write_registry, RegistryRows, REGISTRY_COLUMNS};
pub use error::{PersistenceError, PersistenceResult};
