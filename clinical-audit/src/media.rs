use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Transient reference to submitted media, valid until revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceHandle(Uuid);

impl SourceHandle {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "media:{}", self.0)
    }
}

/// Playable copy of the submitted audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl MediaBlob {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Registry of live media handles.
///
/// Clones share the same storage, so a presenter can resolve handles that
/// the orchestrator registered.
#[derive(Debug, Clone, Default)]
pub struct MediaRegistry {
    blobs: Arc<DashMap<Uuid, Arc<MediaBlob>>>,
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, blob: MediaBlob) -> SourceHandle {
        let handle = SourceHandle(Uuid::new_v4());
        debug!(handle = %handle, bytes = blob.len(), mime_type = %blob.mime_type, "Registered media handle");
        self.blobs.insert(handle.id(), Arc::new(blob));
        handle
    }

    pub fn resolve(&self, handle: &SourceHandle) -> Option<Arc<MediaBlob>> {
        self.blobs.get(&handle.id()).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns `false` when the handle was already revoked.
    pub fn revoke(&self, handle: &SourceHandle) -> bool {
        let removed = self.blobs.remove(&handle.id()).is_some();
        if removed {
            debug!(handle = %handle, "Revoked media handle");
        }
        removed
    }

    pub fn is_live(&self, handle: &SourceHandle) -> bool {
        self.blobs.contains_key(&handle.id())
    }

    pub fn live_count(&self) -> usize {
        self.blobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_resolve_revoke() {
        let registry = MediaRegistry::new();
        let handle = registry.register(MediaBlob::new(vec![0x49, 0x44, 0x33], "audio/mpeg"));

        assert!(registry.is_live(&handle));
        assert_eq!(registry.resolve(&handle).unwrap().mime_type, "audio/mpeg");

        assert!(registry.revoke(&handle));
        assert!(!registry.is_live(&handle));
        assert!(registry.resolve(&handle).is_none());
        assert!(!registry.revoke(&handle));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn clones_share_storage() {
        let registry = MediaRegistry::new();
        let presenter_view = registry.clone();
        let handle = registry.register(MediaBlob::new(vec![1, 2, 3], "audio/wav"));
        assert!(presenter_view.is_live(&handle));
        registry.revoke(&handle);
        assert_eq!(presenter_view.live_count(), 0);
    }
}
