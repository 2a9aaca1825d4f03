use rocket::form::{Form, FromForm};
use rocket::http::CookieJar;
use rocket::response::{Flash, Redirect};
use rocket::{get, post, routes, uri, Route, State};
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::{bootstrap::AdminState, img_log, middleware::*};

/// Token handed over by the provider's client SDK after a hosted sign-in.
#[derive(FromForm)]
pub struct SessionHandOff {
    pub access_token: String,
}

#[get("/auth/login")]
pub async fn get_login(app_context: AppContext<'_>, session: CurrentSession, state: &State<AdminState>) -> Result<Template, Redirect> {
    if let CurrentSession(Some(session)) = session {
        img_log!(Debug, format!("{} is already signed in", session.account_id));
        return Err(Redirect::to(uri!(crate::routes::public::home::get_home)));
    }

    Ok(app_context.render_with("auth/login", json!({ "sign_in_url": state.sign_in_url })))
}

#[post("/auth/session", data = "<hand_off>")]
pub async fn post_session(hand_off: Form<SessionHandOff>, state: &State<AdminState>, cookies: &CookieJar<'_>) -> Result<Flash<Redirect>, Flash<Redirect>> {
    match state.sessions.accept(cookies, &hand_off.access_token) {
        Ok(session) => {
            img_log!(Info, format!("Session accepted for {}", session.account_id));
            Ok(Flash::success(Redirect::to(uri!(crate::routes::admin::get_dashboard)), "Signed in."))
        }
        Err(error) => Err(error.with_user_message("That sign-in could not be verified. Please sign in again.").into()),
    }
}

#[get("/auth/logout")]
pub fn get_logout(state: &State<AdminState>, cookies: &CookieJar<'_>) -> Flash<Redirect> {
    state.sessions.clear(cookies);
    img_log!(Info, "Session cleared");
    Flash::success(Redirect::to(uri!(get_login)), "Signed out.")
}

pub fn routes() -> Vec<Route> {
    routes![get_login, post_session, get_logout]
}
