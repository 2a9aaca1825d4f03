use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::schema::users;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Users {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub credits: i32,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Users {
    pub fn account_role(&self) -> super::AccountRole {
        super::AccountRole::from_column(&self.role)
    }
}
