use rocket::response::Redirect;
use rocket::{catch, Request, Responder};
use rocket_dyn_templates::{context, Template};

use crate::{img_log, middleware::*};

#[derive(Responder)]
pub enum CatcherReply {
    Redirect(Redirect),
    Page(Template),
}

#[catch(401)]
pub async fn unauthorized(req: &Request<'_>) -> Redirect {
    replay_session_cookie(req).await;
    Denial::Login.redirect()
}

#[catch(403)]
pub async fn forbidden(req: &Request<'_>) -> Redirect {
    replay_session_cookie(req).await;
    Denial::Home.redirect()
}

/// Unmatched admin paths get the gate's answer, not a page telling them the route is missing.
#[catch(404)]
pub async fn not_found(req: &Request<'_>) -> CatcherReply {
    replay_session_cookie(req).await;

    if let Some(denial) = decision(req).await.denial() {
        return CatcherReply::Redirect(denial.redirect());
    }

    CatcherReply::Page(Template::render("errors/404", context! { request_uri: req.uri().path().as_str() }))
}

#[catch(500)]
pub async fn internal_error(req: &Request<'_>) -> Template {
    replay_session_cookie(req).await;
    img_log!(Error, format!("Internal error while serving {} {}", req.method(), req.uri()));
    Template::render("errors/500", context! { request_uri: req.uri().path().as_str() })
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use chrono::Duration;
    use rocket::http::{Cookie, Status};

    #[rocket::async_test]
    async fn not_found_page_still_carries_the_refreshed_session() {
        let member = user("Bob", "USER", 1);
        let client = client(MemoryStore::with(vec![member.clone()], vec![])).await;
        let stale = token_for(member.id, Duration::minutes(2));

        let response = client.get("/no-such-page").cookie(Cookie::new("access_token", stale.clone())).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);

        let refreshed = response.cookies().get("access_token").expect("refreshed cookie on 404").value().to_string();
        assert_ne!(refreshed, stale);
        assert_eq!(session_service().decode(&refreshed).unwrap().sub, member.id.to_string());
    }

    #[rocket::async_test]
    async fn catcher_redirect_removes_a_bad_token() {
        let client = client(MemoryStore::default()).await;

        let response = client.get("/admin/missing").cookie(Cookie::new("access_token", "garbage")).dispatch().await;
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/auth/login"));

        let removal = response.cookies().get("access_token").map(|c| c.value().to_string());
        assert_eq!(removal.as_deref(), Some(""));
    }

    #[rocket::async_test]
    async fn not_found_without_a_session_sets_no_cookie() {
        let client = client(MemoryStore::default()).await;

        let response = client.get("/no-such-page").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        assert!(response.cookies().get("access_token").is_none());
    }
}
