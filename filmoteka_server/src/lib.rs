//! HTTP server for the filmoteka movie library.
//!
//! Exposes signup, login and logout over session cookies and guards protected
//! routes with the access gate in [`api::middleware`].

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
