#[macro_use]
extern crate rocket;

use std::process;

use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;

mod bootstrap;
mod database;
mod meltdown;
mod middleware;
mod models;
mod routes;
mod services;
mod structs;

#[cfg(test)]
mod testing;

use bootstrap::*;
use middleware::*;
use routes::*;

/// Assembles the application around an already bootstrapped state.
pub fn ignite(state: AdminState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .attach(AccessGate)
        .attach(Template::fairing())
        .mount_public(public::routes())
        .mount_gated(admin::routes())
        .mount_gated(api::admin::routes())
        .register("/", catchers![unauthorized, forbidden, not_found, internal_error])
}

#[launch]
async fn rocket() -> _ {
    let state = match bootstrap().await {
        Ok(state) => state,
        Err(error) => {
            error.log();
            eprintln!("Startup failed: {}", error.log_message());
            process::exit(1);
        }
    };

    img_log!(Info, "Starting server...");
    ignite(state)
}
