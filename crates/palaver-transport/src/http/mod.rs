//! HTTP transport.
//!
//! Each endpoint is mounted as a `POST` route; the reply becomes either a
//! `200` with the JSON response or a bare `500`.

mod server;

pub use axum::Router;
pub use server::{normalize_path, router, serve};
