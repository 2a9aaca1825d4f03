pub mod images;
pub mod users;
