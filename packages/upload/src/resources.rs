//! Local preview resources.
//!
//! A placeholder shows the user's own bytes until the upload lands. Each
//! preview is registered under a `blob:folio/<uuid>` URL and must be released
//! exactly once; releasing twice is a no-op.

use crate::file::MediaFile;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub const LOCAL_URL_PREFIX: &str = "blob:folio/";

#[derive(Debug, Default)]
pub struct LocalResourceRegistry {
    entries: Arc<Mutex<HashMap<String, MediaFile>>>,
}

impl LocalResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(entries: &Mutex<HashMap<String, MediaFile>>) -> MutexGuard<'_, HashMap<String, MediaFile>> {
        entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self, file: &MediaFile) -> LocalHandle {
        let url = format!("{}{}", LOCAL_URL_PREFIX, uuid::Uuid::new_v4());
        Self::lock(&self.entries).insert(url.clone(), file.clone());

        LocalHandle {
            url,
            entries: self.entries.clone(),
            released: AtomicBool::new(false),
        }
    }

    pub fn get(&self, url: &str) -> Option<MediaFile> {
        Self::lock(&self.entries).get(url).cloned()
    }

    pub fn live_count(&self) -> usize {
        Self::lock(&self.entries).len()
    }
}

/// Owned preview resource. Dropping without `release` leaks the entry until
/// the registry itself is dropped.
#[derive(Debug)]
pub struct LocalHandle {
    url: String,
    entries: Arc<Mutex<HashMap<String, MediaFile>>>,
    released: AtomicBool,
}

impl LocalHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns true only for the call that actually released
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        LocalResourceRegistry::lock(&self.entries).remove(&self.url);
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_exactly_once() {
        let registry = LocalResourceRegistry::new();
        let file = MediaFile::from_bytes("a.png", vec![1u8, 2, 3]);

        let handle = registry.create(&file);
        assert!(handle.url().starts_with(LOCAL_URL_PREFIX));
        assert_eq!(registry.get(handle.url()), Some(file));
        assert_eq!(registry.live_count(), 1);

        assert!(handle.release());
        assert!(!handle.release());
        assert!(handle.is_released());
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.get(handle.url()), None);
    }

    #[test]
    fn test_handles_are_distinct() {
        let registry = LocalResourceRegistry::new();
        let file = MediaFile::from_bytes("a.png", vec![1u8]);
        let a = registry.create(&file);
        let b = registry.create(&file);
        assert_ne!(a.url(), b.url());

        a.release();
        assert_eq!(registry.live_count(), 1);
        assert!(registry.get(b.url()).is_some());
    }
}
