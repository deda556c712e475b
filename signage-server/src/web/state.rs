//! Web server shared state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use signage_descriptor::Descriptor;
use tokio::sync::RwLock;

use crate::render;
use crate::store::Store;

/// Last descriptor successfully served to a player.
#[derive(Debug, Clone)]
pub struct CachedDescriptor {
    pub descriptor: Descriptor,
    pub built_at: Instant,
}

/// Last good descriptor per player, served when a build hits an
/// environment fault.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: RwLock<HashMap<String, CachedDescriptor>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn store(&self, player_id: &str, descriptor: Descriptor) {
        self.entries.write().await.insert(
            player_id.to_string(),
            CachedDescriptor {
                descriptor,
                built_at: Instant::now(),
            },
        );
    }

    pub async fn get(&self, player_id: &str) -> Option<CachedDescriptor> {
        self.entries.read().await.get(player_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Shared state for the web handlers.
pub struct WebState {
    pub store: Arc<Store>,
    pub cache: DescriptorCache,
    /// Locale used when a request names none or a key is missing.
    pub default_locale: String,
    /// Pinned build date; today's local date when unset.
    pub build_date: RwLock<Option<NaiveDate>>,
}

impl WebState {
    pub fn new(store: Arc<Store>, default_locale: impl Into<String>) -> Self {
        Self {
            store,
            cache: DescriptorCache::new(),
            default_locale: default_locale.into(),
            build_date: RwLock::new(None),
        }
    }

    /// Date descriptors are built for.
    pub async fn now(&self) -> NaiveDate {
        self.build_date.read().await.unwrap_or_else(render::today)
    }
}
