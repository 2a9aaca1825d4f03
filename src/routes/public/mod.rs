pub mod auth;
pub mod home;

pub fn routes() -> Vec<rocket::Route> {
    let mut routes = home::routes();
    routes.extend(auth::routes());
    routes
}
