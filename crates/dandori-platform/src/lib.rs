//! Browser platform adapters for the Dandori client.
//!
//! Implements the `dandori-core` port traits plus the plain REST surface
//! (courses, auth) using browser `fetch()` via gloo-net.

pub mod auth;
pub mod chat;
pub mod courses;
pub mod http;

pub use http::DandoriApi;
