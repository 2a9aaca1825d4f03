pub mod admin;
pub mod api;
pub mod public;
pub mod route_group;

pub use route_group::*;
