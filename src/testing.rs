use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rocket::http::Cookie;
use rocket::local::asynchronous::Client;
use uuid::Uuid;

use crate::{
    bootstrap::{AdminState, AppConfig, SessionSettings},
    meltdown::*,
    services::*,
    structs::*,
};

pub const TEST_SECRET: &str = "imagery-test-secret";

pub fn session_settings() -> SessionSettings {
    SessionSettings {
        secure_cookie: false,
        ..SessionSettings::default()
    }
}

pub fn session_service() -> SessionService {
    SessionService::new(TEST_SECRET, session_settings())
}

/// Signs a token the way the authentication provider does.
pub fn sign_token(secret: &str, account_id: Uuid, email: Option<String>, ttl: Duration) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: account_id.to_string(),
        exp: (now + ttl).timestamp().max(0) as usize,
        iat: now.timestamp() as usize,
        email,
        aud: None,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).expect("token signs")
}

pub fn token_for(account_id: Uuid, ttl: Duration) -> String {
    sign_token(TEST_SECRET, account_id, None, ttl)
}

pub fn session_cookie(account: &Users) -> Cookie<'static> {
    Cookie::new("access_token", token_for(account.id, Duration::minutes(50)))
}

fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub fn user(name: &str, role: &str, minutes_ago: i64) -> Users {
    Users {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        credits: 10,
        role: role.to_string(),
        created_at: reference_time() - Duration::minutes(minutes_ago),
    }
}

pub fn image(owner: &Users, status: &str, minutes_ago: i64) -> Images {
    let id = Uuid::new_v4();

    Images {
        id,
        user_id: owner.id,
        original_url: format!("https://cdn.example.com/original/{}.png", id),
        processed_url: (status == ImageStatus::COMPLETED).then(|| format!("https://cdn.example.com/processed/{}.png", id)),
        status: status.to_string(),
        created_at: reference_time() - Duration::minutes(minutes_ago),
    }
}

/// In-memory record store with switchable failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub users: Vec<Users>,
    pub images: Vec<Images>,
    pub fail_roles: bool,
    pub fail_users: bool,
    pub fail_images: bool,
}

impl MemoryStore {
    pub fn with(users: Vec<Users>, images: Vec<Images>) -> Self {
        MemoryStore { users, images, ..Default::default() }
    }
}

#[rocket::async_trait]
impl RecordStore for MemoryStore {
    async fn account_role(&self, account_id: Uuid) -> Result<String, MeltDown> {
        if self.fail_roles {
            return Err(MeltDown::db_connection("role lookup unavailable"));
        }

        self.users
            .iter()
            .find(|user| user.id == account_id)
            .map(|user| user.role.clone())
            .ok_or_else(|| MeltDown::record_not_found("Account"))
    }

    async fn users_newest_first(&self) -> Result<Vec<Users>, MeltDown> {
        if self.fail_users {
            return Err(MeltDown::db_connection("users query failed"));
        }

        let mut users = self.users.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn images_newest_first(&self) -> Result<Vec<Images>, MeltDown> {
        if self.fail_images {
            return Err(MeltDown::db_connection("images query failed"));
        }

        let mut images = self.images.clone();
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(images)
    }
}

pub fn state_with(store: MemoryStore) -> AdminState {
    let config = AppConfig {
        session: session_settings(),
        ..AppConfig::default()
    };

    AdminState::new(session_service(), Arc::new(store), &config)
}

pub async fn client(store: MemoryStore) -> Client {
    Client::untracked(crate::ignite(state_with(store))).await.expect("valid rocket instance")
}
