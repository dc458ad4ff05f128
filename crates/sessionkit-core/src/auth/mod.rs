//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionStore`: in-memory token/profile state with tiered persistence
//! - `TokenStorage`: the storage-tier capability, with memory, file and
//!   OS keychain implementations
//! - `HostContext`: the storage tiers and navigator the store is hosted by
//!
//! A remembered token lives in the durable tier, otherwise in the session
//! tier. At most one tier holds a token at a time.

pub mod credentials;
pub mod host;
pub mod session;
pub mod storage;

pub use credentials::KeyringStorage;
pub use host::{HostContext, LoggingNavigator, Navigator, RecordingNavigator};
pub use session::SessionStore;
pub use storage::{FileStorage, MemoryStorage, StorageTier, TokenStorage, TOKEN_KEY};
