pub mod migration;
pub mod store;

// Re-export commonly used types
pub use migration::{Configuration, MigrateFrom};
pub use store::ConfigurationStore;
