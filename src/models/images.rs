use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::{
    database::{
        db::establish_connection,
        schema::images::dsl::{self as image_dsl},
    },
    meltdown::*,
    structs::*,
};

impl Images {
    pub async fn all_newest_first() -> Result<Vec<Images>, MeltDown> {
        let mut conn = establish_connection().await?;

        image_dsl::images
            .order(image_dsl::created_at.desc())
            .select(Images::as_select())
            .load::<Images>(&mut conn)
            .await
            .map_err(|e| MeltDown::from(e).with_context("operation", "images_newest_first"))
    }
}
