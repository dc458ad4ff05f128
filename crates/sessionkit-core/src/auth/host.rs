use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::info;

use super::{StorageTier, TokenStorage};

/// Moves the host application to another route.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

/// Records every navigation. Clones share the same history.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    history: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.history.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, path: &str) {
        self.history.lock().push(path.to_string());
    }
}

/// Logs the route resolved under the frontend's base path.
pub struct LoggingNavigator {
    base_path: String,
}

impl LoggingNavigator {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Navigator for LoggingNavigator {
    fn navigate_to(&self, path: &str) {
        let target = format!(
            "{}/{}",
            self.base_path.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        info!(route = %path, target = %target, "Navigating");
    }
}

/// Capabilities provided by an interactive host: two token storage tiers
/// and navigation. A store without one keeps its state in memory only.
#[derive(Clone)]
pub struct HostContext {
    durable: Arc<dyn TokenStorage>,
    session: Arc<dyn TokenStorage>,
    navigator: Arc<dyn Navigator>,
}

impl HostContext {
    pub fn new(
        durable: Arc<dyn TokenStorage>,
        session: Arc<dyn TokenStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            durable,
            session,
            navigator,
        }
    }

    pub fn tier(&self, tier: StorageTier) -> &dyn TokenStorage {
        match tier {
            StorageTier::Durable => self.durable.as_ref(),
            StorageTier::Session => self.session.as_ref(),
        }
    }

    /// Write `value` to `tier` and clear `key` from the other tier.
    pub fn persist(&self, tier: StorageTier, key: &str, value: &str) -> Result<()> {
        self.tier(tier).set_item(key, value)?;
        self.tier(tier.other()).remove_item(key)
    }

    /// First non-empty value for `key`, durable tier first.
    pub fn load(&self, key: &str) -> Result<Option<String>> {
        for tier in [StorageTier::Durable, StorageTier::Session] {
            if let Some(value) = self.tier(tier).get_item(key)? {
                if !value.is_empty() {
                    return Ok(Some(value));
                }
            }
        }
        Ok(None)
    }

    /// Remove `key` from both tiers. Both removals are attempted; the first
    /// error is returned.
    pub fn clear(&self, key: &str) -> Result<()> {
        let durable = self.durable.remove_item(key);
        let session = self.session.remove_item(key);
        durable.and(session)
    }

    pub fn navigate_to(&self, path: &str) {
        self.navigator.navigate_to(path);
    }
}
