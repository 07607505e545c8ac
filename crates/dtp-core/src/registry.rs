use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::endpoint::{default_endpoint, Endpoint};

pub type PacketTag = u32;

/// Tag served by [`default_endpoint`] unless a configuration overrides it.
pub const DEFAULT_ENDPOINT_PACKET_TAG: PacketTag = 0;

/// The TagRegistry maps protocol tags to their endpoints.
///
/// ## Invariant: Never Empty
/// A freshly built registry, or one replaced by an empty table, answers the default
/// tag, so an unconfigured server still responds. Once handed to a server it is
/// shared read-only behind an `Arc`.
#[derive(Clone)]
pub struct TagRegistry {
    endpoints: HashMap<PacketTag, Arc<dyn Endpoint>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        let mut endpoints: HashMap<PacketTag, Arc<dyn Endpoint>> = HashMap::new();
        endpoints.insert(DEFAULT_ENDPOINT_PACKET_TAG, Arc::new(default_endpoint));
        Self { endpoints }
    }

    /// Replaces the whole table. An empty table keeps the default entry.
    pub fn from_endpoints<I>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = (PacketTag, Arc<dyn Endpoint>)>,
    {
        let endpoints: HashMap<_, _> = endpoints.into_iter().collect();
        if endpoints.is_empty() {
            return Self::new();
        }
        Self { endpoints }
    }

    /// Binds `endpoint` to `tag`, overriding any previous binding (including the default).
    pub fn route<E: Endpoint>(&mut self, tag: PacketTag, endpoint: E) {
        self.endpoints.insert(tag, Arc::new(endpoint));
    }

    pub fn resolve(&self, tag: PacketTag) -> Option<Arc<dyn Endpoint>> {
        self.endpoints.get(&tag).cloned()
    }

    pub fn contains(&self, tag: PacketTag) -> bool {
        self.endpoints.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = PacketTag> + '_ {
        self.endpoints.keys().copied()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.tags().collect();
        tags.sort_unstable();
        f.debug_struct("TagRegistry").field("tags", &tags).finish()
    }
}
