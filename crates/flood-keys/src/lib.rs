pub mod config;
pub mod error;
pub mod keys_file;
pub mod lookup;
pub mod reference;
pub mod telemetry;
