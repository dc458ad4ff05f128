//! Core library for sessionkit.
//!
//! Provides the session store that owns the authentication token and the
//! current user profile, the storage tiers the token is persisted to, the
//! API client used to fetch the profile, and the client configuration.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, AuthApi};
pub use auth::{HostContext, SessionStore, StorageTier, TokenStorage};
pub use config::Config;
pub use models::{LoginRequest, LoginResponse, Session, UserProfile};
