use rocket::async_trait;
use rocket::http::{CookieJar, Status};
use rocket::outcome::Outcome::{Error, Success};
use rocket::request::{FromRequest, Outcome, Request};

use crate::{bootstrap::AdminState, img_log, meltdown::*, middleware::*, services::*};

#[derive(Debug, Clone, PartialEq)]
pub enum Authorization {
    Granted(Session),
    NoSession,
    NotAdministrator,
}

impl Authorization {
    pub fn denial(&self) -> Option<Denial> {
        match self {
            Authorization::Granted(_) => None,
            Authorization::NoSession => Some(Denial::Login),
            Authorization::NotAdministrator => Some(Denial::Home),
        }
    }
}

/// The one rule both the gate and the pages apply: a session whose account holds the administrator role.
/// A failed role lookup is never a grant.
pub async fn authorize(auth: &dyn AuthProvider, session: Option<Session>) -> Authorization {
    let Some(session) = session else {
        return Authorization::NoSession;
    };

    match auth.get_account_role(session.account_id).await {
        Ok(role) if role.is_administrator() => Authorization::Granted(session),
        Ok(_) => {
            img_log!(Debug, format!("Account {} is not an administrator", session.account_id));
            Authorization::NotAdministrator
        }
        Err(error) => {
            img_log!(Warning, format!("Role lookup for {} failed, denying: {}", session.account_id, error.log_message()));
            Authorization::NotAdministrator
        }
    }
}

/// Session lookup where any failure just means "signed out".
pub async fn lookup_session(auth: &dyn AuthProvider, cookies: &CookieJar<'_>) -> Option<Session> {
    match auth.get_session(cookies).await {
        Ok(session) => session,
        Err(error) => {
            error.log();
            None
        }
    }
}

/// An administrator's session, verified independently of the edge gate.
pub struct AdminSession(pub Session);

#[async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = MeltDown;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(state) = req.rocket().state::<AdminState>() else {
            return Error((Status::Unauthorized, MeltDown::missing_token()));
        };

        let session = lookup_session(state.auth.as_ref(), req.cookies()).await;
        match authorize(state.auth.as_ref(), session).await {
            Authorization::Granted(session) => Success(AdminSession(session)),
            Authorization::NoSession => Error((Status::Unauthorized, MeltDown::missing_token())),
            Authorization::NotAdministrator => Error((Status::Forbidden, MeltDown::insufficient_permissions())),
        }
    }
}

/// Whoever is signed in, if anyone. Shares the gate's per-request lookup.
pub struct CurrentSession(pub Option<Session>);

#[async_trait]
impl<'r> FromRequest<'r> for CurrentSession {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Success(CurrentSession(current_session(req).await.cloned()))
    }
}
