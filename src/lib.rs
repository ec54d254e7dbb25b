pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod notify;
pub mod response;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod test_helpers;
