//! REST API client module.
//!
//! `ApiClient` talks to the backend for the profile and login endpoints.
//! The store depends on the `AuthApi` trait rather than the concrete
//! client so it can be driven without a network.

use std::future::Future;

use anyhow::Result;

use crate::models::{LoginRequest, LoginResponse, UserProfile};

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;

/// Backend operations the session store relies on.
pub trait AuthApi: Send + Sync + 'static {
    /// `GET {api_base}/user/me` with the raw token as `Authorization`.
    fn fetch_me(&self, token: &str) -> impl Future<Output = Result<UserProfile>> + Send;

    /// `POST {api_base}/auth/login`.
    fn login(&self, request: &LoginRequest) -> impl Future<Output = Result<LoginResponse>> + Send;
}
