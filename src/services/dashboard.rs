use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rocket::http::CookieJar;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    img_log,
    middleware::{authorize, lookup_session, Authorization, Denial},
    services::*,
    structs::*,
};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Share of completed images in percent, rounded half up. Zero when there are no images.
pub fn success_rate(completed: usize, total: usize) -> u64 {
    if total == 0 {
        return 0;
    }

    let (completed, total) = (completed as u64, total as u64);
    (200 * completed + total) / (2 * total)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_users: usize,
    pub total_images: usize,
    pub success_rate: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub credits: i32,
    pub role: String,
    pub role_badge: &'static str,
    pub created_at: DateTime<Utc>,
    pub joined: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRow {
    pub id: Uuid,
    pub uploader_email: Option<String>,
    pub original_url: String,
    pub preview_url: Option<String>,
    pub status: String,
    pub status_badge: &'static str,
    pub created_at: DateTime<Utc>,
    pub uploaded: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub recent_users: Vec<UserRow>,
    pub recent_images: Vec<ImageRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub summary: Summary,
    #[serde(flatten)]
    pub recent: RecentActivity,
}

/// Both collections as fetched. A collection whose query failed is empty.
#[derive(Debug, Default)]
pub struct DashboardData {
    pub users: Vec<Users>,
    pub images: Vec<Images>,
}

impl DashboardData {
    /// Runs both reads side by side and waits for both; one failing leaves the other intact.
    pub async fn fetch(store: &dyn RecordStore) -> Self {
        let (users, images) = tokio::join!(store.users_newest_first(), store.images_newest_first());

        let users = users.unwrap_or_else(|error| {
            img_log!(Error, format!("Failed to fetch users for dashboard: {}", error.log_message()));
            Vec::new()
        });
        let images = images.unwrap_or_else(|error| {
            img_log!(Error, format!("Failed to fetch images for dashboard: {}", error.log_message()));
            Vec::new()
        });

        DashboardData { users, images }
    }

    pub fn summary(&self) -> Summary {
        let completed = self.images.iter().filter(|image| image.status() == ImageStatus::Completed).count();

        Summary {
            total_users: self.users.len(),
            total_images: self.images.len(),
            success_rate: success_rate(completed, self.images.len()),
        }
    }

    pub fn recent_users(&self, limit: usize) -> Vec<UserRow> {
        let mut users: Vec<&Users> = self.users.iter().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        users
            .into_iter()
            .take(limit)
            .map(|user| UserRow {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
                credits: user.credits,
                role: user.role.clone(),
                role_badge: user.account_role().badge(),
                created_at: user.created_at,
                joined: user.created_at.format(DATE_FORMAT).to_string(),
            })
            .collect()
    }

    pub fn recent_images(&self, limit: usize) -> Vec<ImageRow> {
        let emails: HashMap<Uuid, &str> = self.users.iter().map(|user| (user.id, user.email.as_str())).collect();

        let mut images: Vec<&Images> = self.images.iter().collect();
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        images
            .into_iter()
            .take(limit)
            .map(|image| ImageRow {
                id: image.id,
                uploader_email: emails.get(&image.user_id).map(|email| email.to_string()),
                original_url: image.original_url.clone(),
                preview_url: image.processed_url.clone().filter(|url| !url.is_empty()),
                status: image.status.clone(),
                status_badge: image.status().badge(),
                created_at: image.created_at,
                uploaded: image.created_at.format(DATE_FORMAT).to_string(),
            })
            .collect()
    }

    pub fn recent(&self, limit: usize) -> RecentActivity {
        RecentActivity {
            recent_users: self.recent_users(limit),
            recent_images: self.recent_images(limit),
        }
    }

    pub fn view(&self, limit: usize) -> DashboardView {
        DashboardView {
            summary: self.summary(),
            recent: self.recent(limit),
        }
    }
}

/// Outcome of loading the dashboard. While `load` is pending the page is loading;
/// it settles into exactly one of these.
#[derive(Debug)]
pub enum DashboardState {
    Unauthorized(Denial),
    Ready(DashboardView),
}

impl DashboardState {
    /// Re-checks the caller on its own before touching any data.
    pub async fn load(auth: &dyn AuthProvider, store: &dyn RecordStore, cookies: &CookieJar<'_>, recent_limit: usize) -> Self {
        let session = lookup_session(auth, cookies).await;

        match authorize(auth, session).await {
            Authorization::Granted(session) => {
                img_log!(Debug, format!("Loading dashboard for {}", session.account_id));
                DashboardState::Ready(DashboardData::fetch(store).await.view(recent_limit))
            }
            Authorization::NoSession => DashboardState::Unauthorized(Denial::Login),
            Authorization::NotAdministrator => DashboardState::Unauthorized(Denial::Home),
        }
    }
}
