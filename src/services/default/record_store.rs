use uuid::Uuid;

use crate::{meltdown::*, structs::*};

/// Read access to the records the admin panel reports on.
#[rocket::async_trait]
pub trait RecordStore: Send + Sync {
    /// Raw `role` column of the account.
    async fn account_role(&self, account_id: Uuid) -> Result<String, MeltDown>;

    async fn users_newest_first(&self) -> Result<Vec<Users>, MeltDown>;

    async fn images_newest_first(&self) -> Result<Vec<Images>, MeltDown>;
}

/// Postgres through the shared connection pool.
pub struct PgStore;

#[rocket::async_trait]
impl RecordStore for PgStore {
    async fn account_role(&self, account_id: Uuid) -> Result<String, MeltDown> {
        Users::role_by_id(account_id).await
    }

    async fn users_newest_first(&self) -> Result<Vec<Users>, MeltDown> {
        Users::all_newest_first().await
    }

    async fn images_newest_first(&self) -> Result<Vec<Images>, MeltDown> {
        Images::all_newest_first().await
    }
}
