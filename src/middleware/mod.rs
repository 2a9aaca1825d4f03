pub mod app_context;
pub mod catchers;
pub mod gate;
pub mod guards;

pub use app_context::*;
pub use catchers::*;
pub use gate::*;
pub use guards::*;
