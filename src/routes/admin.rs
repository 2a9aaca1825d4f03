use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::{get, routes, uri, Route, State};
use rocket_dyn_templates::Template;

use crate::{bootstrap::AdminState, middleware::*, services::*};

#[get("/admin")]
pub fn get_admin() -> Redirect {
    Redirect::to(uri!(get_dashboard))
}

#[get("/admin/dashboard")]
pub async fn get_dashboard(app_context: AppContext<'_>, state: &State<AdminState>, cookies: &CookieJar<'_>) -> Result<Template, Redirect> {
    match DashboardState::load(state.auth.as_ref(), state.store.as_ref(), cookies, state.dashboard.recent_limit).await {
        DashboardState::Ready(view) => Ok(app_context.render_with("admin/dashboard", &view)),
        DashboardState::Unauthorized(denial) => Err(denial.redirect()),
    }
}

pub fn routes() -> Vec<Route> {
    routes![get_admin, get_dashboard]
}
