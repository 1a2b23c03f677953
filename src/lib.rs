pub mod config;
pub mod error;
pub mod importer;
pub mod platform;
pub mod wxr;

pub use error::ImportError;
