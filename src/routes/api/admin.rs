use rocket::serde::json::Json;
use rocket::{get, routes, Route, State};

use crate::{bootstrap::AdminState, img_log, middleware::AdminSession, services::*};

#[get("/api/admin/stats")]
pub async fn get_stats(admin: AdminSession, state: &State<AdminState>) -> Json<Summary> {
    img_log!(Debug, format!("Stats requested by {}", admin.0.account_id));
    Json(DashboardData::fetch(state.store.as_ref()).await.summary())
}

#[get("/api/admin/recent")]
pub async fn get_recent(admin: AdminSession, state: &State<AdminState>) -> Json<RecentActivity> {
    img_log!(Debug, format!("Recent activity requested by {}", admin.0.account_id));
    Json(DashboardData::fetch(state.store.as_ref()).await.recent(state.dashboard.recent_limit))
}

pub fn routes() -> Vec<Route> {
    routes![get_stats, get_recent]
}
