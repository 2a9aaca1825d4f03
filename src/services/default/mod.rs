pub mod auth_provider;
pub mod logger;
pub mod record_store;
pub mod session_service;

pub use auth_provider::*;
pub use logger::*;
pub use record_store::*;
pub use session_service::*;
