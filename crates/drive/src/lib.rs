//! Drive metadata API client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.

mod client;

pub use client::{Client, DEFAULT_BASE_URL, DriveApi, DriveFuture, Error};
