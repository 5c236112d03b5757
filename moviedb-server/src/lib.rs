//! # moviedb server
//!
//! HTTP front of the movie catalog:
//!
//! - **Catalog**: list everything, upsert movies (cast and genre names become
//!   sequential ids) and actors, count plays
//! - **Images**: covers, thumbnails, portraits and face crops derived on
//!   demand, with placeholders for anything missing

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
