pub mod dashboard;
pub mod default;

pub use dashboard::*;
pub use default::*;
