use rocket::route::Route;
use rocket::Build;
use rocket::Rocket;

use crate::middleware::gated;

pub trait RocketExt {
    /// Mounts routes that anyone may reach.
    fn mount_public(self, routes: Vec<Route>) -> Self;

    /// Mounts admin-only routes behind the access gate.
    fn mount_gated(self, routes: Vec<Route>) -> Self;
}

impl RocketExt for Rocket<Build> {
    fn mount_public(self, routes: Vec<Route>) -> Self {
        self.mount("/", routes)
    }

    fn mount_gated(self, routes: Vec<Route>) -> Self {
        self.mount("/", gated(routes))
    }
}
