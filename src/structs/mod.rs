pub mod images;
pub mod role;
pub mod users;

pub use images::*;
pub use role::*;
pub use users::*;
