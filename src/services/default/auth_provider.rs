use std::sync::Arc;

use rocket::http::CookieJar;
use uuid::Uuid;

use crate::{meltdown::*, services::*, structs::AccountRole};

/// The hosted authentication provider as seen by the admin panel.
#[rocket::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session from the request cookies, refreshing it when it is about to lapse.
    async fn get_session(&self, cookies: &CookieJar<'_>) -> Result<Option<Session>, MeltDown>;

    async fn get_account_role(&self, account_id: Uuid) -> Result<AccountRole, MeltDown>;
}

/// Sessions come from signed cookies, roles from the provider's `users` table.
pub struct HostedAuth {
    sessions: SessionService,
    store: Arc<dyn RecordStore>,
}

impl HostedAuth {
    pub fn new(sessions: SessionService, store: Arc<dyn RecordStore>) -> Self {
        HostedAuth { sessions, store }
    }
}

#[rocket::async_trait]
impl AuthProvider for HostedAuth {
    async fn get_session(&self, cookies: &CookieJar<'_>) -> Result<Option<Session>, MeltDown> {
        self.sessions.lookup(cookies)
    }

    async fn get_account_role(&self, account_id: Uuid) -> Result<AccountRole, MeltDown> {
        let role = self.store.account_role(account_id).await?;
        Ok(AccountRole::from_column(&role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn provider(store: MemoryStore) -> HostedAuth {
        HostedAuth::new(session_service(), Arc::new(store))
    }

    #[rocket::async_test]
    async fn role_column_decides_administrator() {
        let admin = user("Ada", "ADMIN", 1);
        let member = user("Bob", "USER", 2);
        let auth = provider(MemoryStore::with(vec![admin.clone(), member.clone()], vec![]));

        assert_eq!(auth.get_account_role(admin.id).await.unwrap(), AccountRole::Administrator);
        assert_eq!(auth.get_account_role(member.id).await.unwrap(), AccountRole::Member);
    }

    #[rocket::async_test]
    async fn unknown_account_is_an_error() {
        let auth = provider(MemoryStore::default());

        let error = auth.get_account_role(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(error.melt_type, MeltType::RecordNotFound);
    }

    #[rocket::async_test]
    async fn store_failure_propagates() {
        let admin = user("Ada", "ADMIN", 1);
        let mut store = MemoryStore::with(vec![admin.clone()], vec![]);
        store.fail_roles = true;

        assert!(provider(store).get_account_role(admin.id).await.is_err());
    }
}
