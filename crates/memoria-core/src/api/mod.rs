//! REST API client module for the memoria backend.
//!
//! This module provides the `ApiClient` used to log in and to fetch the
//! JSON resources behind each dashboard section, and `ApiError`, which
//! classifies failures into auth, transient and malformed-response cases.
//!
//! Requests carry a bearer token obtained from `/api/auth/login`.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
