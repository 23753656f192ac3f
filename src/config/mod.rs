/// Database connection and schema creation
pub mod database;

/// Shop settings and starter catalog from config.toml
pub mod shop;
