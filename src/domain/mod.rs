pub mod client_config;
pub mod error;
pub mod prediction;
pub mod record;
pub mod schema;
