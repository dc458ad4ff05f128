//! Data models shared by the store and the API client.
//!
//! - `UserProfile`: the record returned by `GET /user/me`
//! - `Session`: a snapshot of the store's state
//! - `LoginRequest`, `LoginResponse`: the login exchange

pub mod session;
pub mod user;

pub use session::Session;
pub use user::{LoginCredential, LoginRequest, LoginResponse, UserProfile};
