use rocket::{
    async_trait,
    outcome::Outcome::Success,
    request::{FlashMessage, FromRequest, Outcome, Request},
};
use rocket_dyn_templates::Template;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{bootstrap::AdminState, img_log, middleware::current_session};

pub struct AppContext<'r> {
    flash: Option<FlashMessage<'r>>,
    request_uri: String,
    environment: String,
    account_email: Option<String>,
    signed_in: bool,
}

#[derive(Serialize, Debug, Default)]
pub struct BaseContext {
    pub flash: Option<(String, String)>,
    pub title: Option<String>,
    pub environment: String,
    pub request_uri: String,
    pub account_email: Option<String>,
    pub signed_in: bool,
}

#[async_trait]
impl<'r> FromRequest<'r> for AppContext<'r> {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let flash = req.guard::<FlashMessage<'_>>().await.succeeded();
        let session = current_session(req).await;

        let environment = req.rocket().state::<AdminState>().map(|state| state.environment.clone()).unwrap_or_else(|| "prod".to_string());

        Success(AppContext {
            flash,
            request_uri: req.uri().path().to_string(),
            environment,
            account_email: session.and_then(|s| s.email.clone()),
            signed_in: session.is_some(),
        })
    }
}

fn page_title(page_key: &str) -> Option<&'static str> {
    match page_key {
        "index" => Some("Imagery"),
        "auth/login" => Some("Sign in"),
        "admin/dashboard" => Some("Admin dashboard"),
        _ => None,
    }
}

impl<'r> AppContext<'r> {
    pub fn build_context(&self, page_key: &str) -> BaseContext {
        BaseContext {
            flash: self.flash.as_ref().map(|f| (f.kind().to_string(), f.message().to_string())),
            title: page_title(page_key).map(String::from),
            environment: self.environment.clone(),
            request_uri: self.request_uri.clone(),
            account_email: self.account_email.clone(),
            signed_in: self.signed_in,
        }
    }

    pub fn render(&self, page_key: &str) -> Template {
        self.render_with(page_key, ())
    }

    /// Renders with the base context, letting keys from `extra` override it.
    pub fn render_with<T: Serialize>(&self, page_key: &str, extra: T) -> Template {
        let mut context = Map::new();

        for value in [serde_json::to_value(self.build_context(page_key)), serde_json::to_value(&extra)] {
            match value {
                Ok(Value::Object(obj)) => context.extend(obj),
                Ok(_) => (),
                Err(e) => img_log!(Error, format!("Failed to serialize context for {}: {}", page_key, e)),
            }
        }

        Template::render(page_key.to_string(), &context)
    }
}
