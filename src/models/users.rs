use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::{
    database::{
        db::establish_connection,
        schema::users::dsl::{self as user_dsl},
    },
    meltdown::*,
    structs::*,
};

impl Users {
    pub async fn all_newest_first() -> Result<Vec<Users>, MeltDown> {
        let mut conn = establish_connection().await?;

        user_dsl::users
            .order(user_dsl::created_at.desc())
            .select(Users::as_select())
            .load::<Users>(&mut conn)
            .await
            .map_err(|e| MeltDown::from(e).with_context("operation", "users_newest_first"))
    }

    pub async fn role_by_id(id: Uuid) -> Result<String, MeltDown> {
        let mut conn = establish_connection().await?;

        user_dsl::users
            .filter(user_dsl::id.eq(id))
            .select(user_dsl::role)
            .first::<String>(&mut conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => MeltDown::record_not_found("Account").with_context("id", id.to_string()),
                other => MeltDown::from(other).with_context("operation", "role_by_id").with_context("id", id.to_string()),
            })
    }
}
