pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod routes;
pub mod seed;
pub mod server;
pub mod state;
pub mod storage;
pub mod validation;
