use rocket::{
    data::Data,
    fairing::{Fairing, Info, Kind},
    response::Redirect,
    route::{Handler, Outcome},
    Request, Route,
};

use crate::{bootstrap::AdminState, img_log, middleware::*, services::*};

/// Path prefixes reserved for administrators. Matched on the raw string, so `/adminx` is covered too.
pub const PROTECTED_PREFIXES: [&str; 2] = ["/admin", "/api/admin"];

pub const LOGIN_PATH: &str = "/auth/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Login,
    Home,
}

impl Denial {
    pub fn location(&self) -> &'static str {
        match self {
            Denial::Login => LOGIN_PATH,
            Denial::Home => HOME_PATH,
        }
    }

    pub fn redirect(&self) -> Redirect {
        Redirect::to(self.location())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    PassThrough,
    Authorized(Session),
    RedirectToLogin,
    RedirectToHome,
}

impl GateDecision {
    pub fn denial(&self) -> Option<Denial> {
        match self {
            GateDecision::RedirectToLogin => Some(Denial::Login),
            GateDecision::RedirectToHome => Some(Denial::Home),
            GateDecision::PassThrough | GateDecision::Authorized(_) => None,
        }
    }
}

pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// The path the gate judges: the raw path when it is protected as written,
/// otherwise the decoded segments, so `/%61dmin` is treated as `/admin`.
fn gate_path(req: &Request<'_>) -> String {
    let path = req.uri().path();
    if is_protected(path.as_str()) {
        return path.as_str().to_string();
    }

    format!("/{}", path.segments().collect::<Vec<_>>().join("/"))
}

pub async fn decide(path: &str, session: Option<Session>, auth: &dyn AuthProvider) -> GateDecision {
    if !is_protected(path) {
        return GateDecision::PassThrough;
    }

    match authorize(auth, session).await {
        Authorization::Granted(session) => GateDecision::Authorized(session),
        Authorization::NoSession => GateDecision::RedirectToLogin,
        Authorization::NotAdministrator => GateDecision::RedirectToHome,
    }
}

async fn evaluate(req: &Request<'_>) -> GateDecision {
    let path = gate_path(req);
    let session = current_session(req).await.cloned();

    match req.rocket().state::<AdminState>() {
        Some(state) => decide(&path, session, state.auth.as_ref()).await,
        None if is_protected(&path) => GateDecision::RedirectToLogin,
        None => GateDecision::PassThrough,
    }
}

/// Gate verdict for this request, computed once and cached for the rest of the request.
pub async fn decision<'a>(req: &'a Request<'_>) -> &'a GateDecision {
    req.local_cache_async(evaluate(req)).await
}

struct CachedSession(Option<Session>);

/// Session of the caller, looked up (and refreshed) at most once per request.
pub async fn current_session<'a>(req: &'a Request<'_>) -> Option<&'a Session> {
    let cached = req
        .local_cache_async(async {
            match req.rocket().state::<AdminState>() {
                Some(state) => CachedSession(lookup_session(state.auth.as_ref(), req.cookies()).await),
                None => {
                    img_log!(Error, "AdminState is not managed, treating request as anonymous");
                    CachedSession(None)
                }
            }
        })
        .await;

    cached.0.as_ref()
}

/// Error catchers start from an empty cookie delta, so the refreshed cookie (or its
/// removal) from this request's lookup has to be written again before they answer.
pub async fn replay_session_cookie(req: &Request<'_>) {
    let Some(state) = req.rocket().state::<AdminState>() else {
        return;
    };

    match current_session(req).await {
        Some(session) => state.sessions.store(req.cookies(), session),
        None if state.sessions.has_cookie(req.cookies()) => state.sessions.clear(req.cookies()),
        None => (),
    }
}

/// Runs ahead of routing on every request: refreshes the session cookie and decides access.
pub struct AccessGate;

#[rocket::async_trait]
impl Fairing for AccessGate {
    fn info(&self) -> Info {
        Info {
            name: "Admin Access Gate",
            kind: Kind::Request,
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        if let Some(denial) = decision(req).await.denial() {
            img_log!(Info, format!("{} {} denied, redirecting to {}", req.method(), req.uri().path(), denial.location()));
        }
    }
}

/// Wraps an admin route so a denied request is redirected before the handler runs.
#[derive(Clone)]
pub struct Gated {
    inner: Box<dyn Handler>,
}

impl Gated {
    #[inline]
    pub fn new(inner: Box<dyn Handler>) -> Self {
        Self { inner }
    }
}

#[rocket::async_trait]
impl Handler for Gated {
    async fn handle<'r>(&self, req: &'r Request<'_>, data: Data<'r>) -> Outcome<'r> {
        let denial = match decision(req).await {
            GateDecision::Authorized(_) => None,
            GateDecision::RedirectToLogin => Some(Denial::Login),
            GateDecision::RedirectToHome => Some(Denial::Home),
            // Only admin routes are wrapped, whatever path reached them.
            GateDecision::PassThrough => authorize_request(req).await.denial(),
        };

        match denial {
            Some(denial) => Outcome::from(req, denial.redirect()),
            None => self.inner.handle(req, data).await,
        }
    }
}

async fn authorize_request(req: &Request<'_>) -> Authorization {
    let session = current_session(req).await.cloned();

    match req.rocket().state::<AdminState>() {
        Some(state) => authorize(state.auth.as_ref(), session).await,
        None => Authorization::NoSession,
    }
}

pub fn gated(routes: Vec<Route>) -> Vec<Route> {
    routes
        .into_iter()
        .map(|mut route| {
            let original = route.handler.clone();
            route.handler = Box::new(Gated::new(original));
            route
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use chrono::Duration;
    use proptest::prelude::*;
    use rocket::http::{Cookie, Status};
    use std::sync::Arc;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap()
    }

    fn provider(store: MemoryStore) -> HostedAuth {
        HostedAuth::new(session_service(), Arc::new(store))
    }

    fn session_of(user: &crate::structs::Users) -> Session {
        Session {
            account_id: user.id,
            email: Some(user.email.clone()),
            expires_at: chrono::Utc::now() + Duration::minutes(30),
            access_token: token_for(user.id, Duration::minutes(30)),
        }
    }

    fn location(response: &rocket::local::asynchronous::LocalResponse<'_>) -> Option<String> {
        response.headers().get_one("Location").map(str::to_string)
    }

    #[test]
    fn prefixes_are_matched_on_the_raw_string() {
        assert!(is_protected("/admin"));
        assert!(is_protected("/admin/dashboard"));
        assert!(is_protected("/administrators"));
        assert!(is_protected("/api/admin/stats"));
        assert!(!is_protected("/"));
        assert!(!is_protected("/api/images"));
        assert!(!is_protected("/auth/login"));
        assert!(!is_protected("/Admin"));
    }

    #[test]
    fn role_lookup_failure_denies_like_a_member() {
        let admin = user("Ada", "ADMIN", 1);
        let mut store = MemoryStore::with(vec![admin.clone()], vec![]);
        store.fail_roles = true;
        let auth = provider(store);

        let decision = runtime().block_on(decide("/admin/dashboard", Some(session_of(&admin)), &auth));
        assert_eq!(decision, GateDecision::RedirectToHome);
    }

    #[test]
    fn admin_session_is_authorized() {
        let admin = user("Ada", "ADMIN", 1);
        let auth = provider(MemoryStore::with(vec![admin.clone()], vec![]));
        let session = session_of(&admin);

        let decision = runtime().block_on(decide("/api/admin/stats", Some(session.clone()), &auth));
        assert_eq!(decision, GateDecision::Authorized(session));
    }

    proptest! {
        #[test]
        fn anonymous_requests_under_a_protected_prefix_go_to_login(
            prefix in prop_oneof![Just("/admin"), Just("/api/admin")],
            rest in "[a-zA-Z0-9/_.%-]{0,24}",
        ) {
            let path = format!("{}{}", prefix, rest);
            let auth = provider(MemoryStore::default());

            let decision = runtime().block_on(decide(&path, None, &auth));
            prop_assert_eq!(decision, GateDecision::RedirectToLogin);
        }

        #[test]
        fn other_paths_pass_through_whoever_asks(
            path in "/[a-zA-Z0-9/_.-]{0,24}",
            role in prop_oneof![Just("ADMIN"), Just("USER"), Just("")],
            signed_in in any::<bool>(),
        ) {
            prop_assume!(!is_protected(&path));
            let account = user("Eve", role, 1);
            let auth = provider(MemoryStore::with(vec![account.clone()], vec![]));
            let session = signed_in.then(|| session_of(&account));

            let decision = runtime().block_on(decide(&path, session, &auth));
            prop_assert_eq!(decision, GateDecision::PassThrough);
        }

        #[test]
        fn non_admin_roles_are_sent_home(role in "[A-Za-z ]{0,8}") {
            prop_assume!(role != "ADMIN");
            let account = user("Mo", &role, 1);
            let auth = provider(MemoryStore::with(vec![account.clone()], vec![]));

            let decision = runtime().block_on(decide("/admin", Some(session_of(&account)), &auth));
            prop_assert_eq!(decision, GateDecision::RedirectToHome);
        }
    }

    #[rocket::async_test]
    async fn anonymous_dashboard_request_redirects_to_login() {
        let client = client(MemoryStore::default()).await;

        let response = client.get("/admin/dashboard").dispatch().await;
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(location(&response).as_deref(), Some("/auth/login"));
    }

    #[rocket::async_test]
    async fn member_is_sent_home() {
        let member = user("Bob", "USER", 1);
        let client = client(MemoryStore::with(vec![member.clone()], vec![])).await;

        let response = client.get("/admin/dashboard").cookie(session_cookie(&member)).dispatch().await;
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(location(&response).as_deref(), Some("/"));
    }

    #[rocket::async_test]
    async fn role_lookup_error_on_the_api_is_sent_home() {
        let admin = user("Ada", "ADMIN", 1);
        let mut store = MemoryStore::with(vec![admin.clone()], vec![]);
        store.fail_roles = true;
        let client = client(store).await;

        let response = client.get("/api/admin/stats").cookie(session_cookie(&admin)).dispatch().await;
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(location(&response).as_deref(), Some("/"));
    }

    #[rocket::async_test]
    async fn home_page_is_open_to_anonymous_visitors() {
        let client = client(MemoryStore::default()).await;

        let response = client.get("/").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn unknown_admin_route_redirects_anonymous_callers() {
        let client = client(MemoryStore::default()).await;

        let response = client.get("/admin/missing").dispatch().await;
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(location(&response).as_deref(), Some("/auth/login"));
    }

    #[rocket::async_test]
    async fn unknown_admin_route_is_a_plain_404_for_admins() {
        let admin = user("Ada", "ADMIN", 1);
        let client = client(MemoryStore::with(vec![admin.clone()], vec![])).await;

        let response = client.get("/admin/missing").cookie(session_cookie(&admin)).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn encoded_prefix_is_still_gated() {
        let client = client(MemoryStore::default()).await;

        let response = client.get("/%61dmin/dashboard").dispatch().await;
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(location(&response).as_deref(), Some("/auth/login"));
    }

    #[rocket::async_test]
    async fn session_is_refreshed_on_public_pages() {
        let member = user("Bob", "USER", 1);
        let client = client(MemoryStore::with(vec![member.clone()], vec![])).await;
        let stale = token_for(member.id, Duration::minutes(2));

        let response = client.get("/").cookie(Cookie::new("access_token", stale.clone())).dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let refreshed = response.cookies().get("access_token").expect("refreshed cookie").value().to_string();
        assert_ne!(refreshed, stale);
        assert_eq!(session_service().decode(&refreshed).unwrap().sub, member.id.to_string());
    }

    #[rocket::async_test]
    async fn garbage_token_is_dropped_and_treated_as_anonymous() {
        let client = client(MemoryStore::default()).await;

        let response = client.get("/admin/dashboard").cookie(Cookie::new("access_token", "garbage")).dispatch().await;
        assert_eq!(location(&response).as_deref(), Some("/auth/login"));

        let removal = response.cookies().get("access_token").map(|c| c.value().to_string());
        assert_eq!(removal.as_deref(), Some(""));
    }
}
