use std::env;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JWTHeader, Validation};
use rocket::http::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{bootstrap::SessionSettings, img_log, meltdown::*};

/// Claims the authentication provider puts in its access tokens. Unknown claims are ignored.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub account_id: Uuid,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    pub access_token: String,
}

#[derive(Clone)]
pub struct SessionService {
    secret: String,
    settings: SessionSettings,
}

impl SessionService {
    pub fn new(secret: impl Into<String>, settings: SessionSettings) -> Self {
        SessionService { secret: secret.into(), settings }
    }

    pub fn from_env(settings: SessionSettings) -> Result<Self, MeltDown> {
        let secret = env::var("JWT_SECRET").map_err(|e| MeltDown::new(MeltType::ConfigurationError, format!("JWT_SECRET not set: {}", e)))?;
        Ok(Self::new(secret, settings))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, MeltDown> {
        let mut validation = Validation::default();
        validation.leeway = self.settings.leeway_secs;
        match &self.settings.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        decode::<Claims>(token, &DecodingKey::from_secret(self.secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(MeltDown::from)
    }

    fn encode(&self, claims: &Claims) -> Result<String, MeltDown> {
        encode(&JWTHeader::default(), claims, &EncodingKey::from_secret(self.secret.as_bytes())).map_err(MeltDown::from)
    }

    fn session_from(&self, claims: &Claims, access_token: String) -> Result<Session, MeltDown> {
        let account_id = Uuid::parse_str(&claims.sub).map_err(|e| MeltDown::invalid_token(format!("Subject is not an account id: {}", e)))?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0).unwrap_or_else(Utc::now);

        Ok(Session {
            account_id,
            email: claims.email.clone(),
            expires_at,
            access_token,
        })
    }

    /// Reads the session cookie, re-signing it when it is close to expiry and writing it back.
    ///
    /// A missing, expired or tampered token yields `Ok(None)` and the cookie is dropped.
    /// Only configuration problems (such as an unusable signing key) surface as errors.
    pub fn lookup(&self, cookies: &CookieJar<'_>) -> Result<Option<Session>, MeltDown> {
        let token = match cookies.get(&self.settings.cookie_name) {
            Some(cookie) => cookie.value().to_string(),
            None => return Ok(None),
        };

        let mut claims = match self.decode(&token) {
            Ok(claims) => claims,
            Err(error) if error.is_token_problem() => {
                img_log!(Debug, format!("Discarding session cookie: {}", error.log_message()));
                self.clear(cookies);
                return Ok(None);
            }
            Err(error) => return Err(error),
        };

        let now = Utc::now();
        let remaining = (claims.exp as i64).saturating_sub(now.timestamp());
        let threshold = Duration::minutes(self.settings.refresh_threshold_mins as i64).num_seconds();

        let token = if remaining < threshold {
            claims.exp = (now + Duration::minutes(self.settings.session_ttl_mins as i64)).timestamp() as usize;
            claims.iat = now.timestamp() as usize;
            let refreshed = self.encode(&claims)?;
            img_log!(Debug, format!("Refreshed session for {}: {}s were left", claims.sub, remaining));
            refreshed
        } else {
            token
        };

        let session = match self.session_from(&claims, token) {
            Ok(session) => session,
            Err(error) => {
                img_log!(Warning, error.log_message());
                self.clear(cookies);
                return Ok(None);
            }
        };

        self.store(cookies, &session);
        Ok(Some(session))
    }

    /// Accepts a token handed over by the provider's client SDK.
    pub fn accept(&self, cookies: &CookieJar<'_>, token: &str) -> Result<Session, MeltDown> {
        let claims = self.decode(token)?;
        let session = self.session_from(&claims, token.to_string())?;
        self.store(cookies, &session);
        Ok(session)
    }

    /// Writes the session cookie carrying `session.access_token`.
    pub fn store(&self, cookies: &CookieJar<'_>, session: &Session) {
        let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);

        cookies.add(
            Cookie::build((self.settings.cookie_name.clone(), session.access_token.clone()))
                .http_only(true)
                .secure(self.settings.secure_cookie)
                .same_site(SameSite::Lax)
                .path("/")
                .max_age(rocket::time::Duration::seconds(max_age)),
        );
    }

    pub fn has_cookie(&self, cookies: &CookieJar<'_>) -> bool {
        cookies.get(&self.settings.cookie_name).is_some()
    }

    pub fn clear(&self, cookies: &CookieJar<'_>) {
        cookies.remove(Cookie::build((self.settings.cookie_name.clone(), "")).path("/"));
    }
}
