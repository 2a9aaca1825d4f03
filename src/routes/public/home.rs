use crate::middleware::*;
use rocket::{get, routes, Route};
use rocket_dyn_templates::Template;

#[get("/")]
pub async fn get_home(app_context: AppContext<'_>) -> Template {
    app_context.render("index")
}

pub fn routes() -> Vec<Route> {
    routes![get_home]
}
