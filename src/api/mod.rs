// HTTP routes and handlers

pub mod analytics;
pub mod health;
pub mod routes;
