use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

/// Reference to an image or audio resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceUri {
    /// Minted by a [`ResourceRegistry`] for a selected file; owns a handle.
    Local { handle: u64, uri: String },
    /// Anything else (remote URL, bundled asset); nothing to release.
    External(String),
}

impl ResourceUri {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local { uri, .. } => uri,
            Self::External(uri) => uri,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResourceUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Mints process-local URIs for selected files and releases them.
///
/// Nothing survives the process; the registry only exists so that every
/// minted handle is accounted for and released exactly once.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    next_handle: u64,
    live: HashMap<u64, PathBuf>,
}

pub const LOCAL_SCHEME: &str = "blob:yuletree/";

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, path: &Path) -> ResourceUri {
        self.next_handle += 1;
        let handle = self.next_handle;
        self.live.insert(handle, path.to_path_buf());
        ResourceUri::Local {
            handle,
            uri: format!("{LOCAL_SCHEME}{handle}"),
        }
    }

    /// Releases the handle behind a local URI and returns the file it was
    /// minted for. External URIs and already released handles give `None`.
    pub fn release(&mut self, uri: &ResourceUri) -> Option<PathBuf> {
        match uri {
            ResourceUri::Local { handle, .. } => {
                let path = self.live.remove(handle)?;
                tracing::debug!(handle, file = %path.display(), "released local resource");
                Some(path)
            }
            ResourceUri::External(_) => None,
        }
    }

    pub fn live_handles(&self) -> usize {
        self.live.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry {
    pub uri: ResourceUri,
}

/// Ordered photo collection with a revision counter for memoisation.
#[derive(Debug, Default)]
pub struct PhotoSet {
    entries: Vec<GalleryEntry>,
    uris: Vec<ResourceUri>,
    revision: u64,
}

impl PhotoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend<I>(&mut self, uris: I) -> usize
    where
        I: IntoIterator<Item = ResourceUri>,
    {
        let before = self.entries.len();
        for uri in uris {
            self.uris.push(uri.clone());
            self.entries.push(GalleryEntry { uri });
        }
        let added = self.entries.len() - before;
        if added > 0 {
            self.revision += 1;
        }
        added
    }

    /// Removes the entry with `uri`, keeping the order of the rest.
    pub fn remove(&mut self, uri: &str) -> Option<GalleryEntry> {
        let index = self.entries.iter().position(|e| e.uri.as_str() == uri)?;
        self.uris.remove(index);
        self.revision += 1;
        Some(self.entries.remove(index))
    }

    pub fn find(&self, uri: &str) -> Option<&GalleryEntry> {
        self.entries.iter().find(|e| e.uri.as_str() == uri)
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn uris(&self) -> &[ResourceUri] {
        &self.uris
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_set(count: usize) -> (ResourceRegistry, PhotoSet) {
        let mut registry = ResourceRegistry::new();
        let mut set = PhotoSet::new();
        set.extend((0..count).map(|i| registry.mint(Path::new(&format!("photo-{i}.jpg")))));
        (registry, set)
    }

    #[test]
    fn minted_uris_are_unique_and_tracked() {
        let (registry, set) = local_set(3);
        assert_eq!(registry.live_handles(), 3);
        let uris: Vec<_> = set.uris().iter().map(ResourceUri::as_str).collect();
        assert_eq!(
            uris,
            ["blob:yuletree/1", "blob:yuletree/2", "blob:yuletree/3"]
        );
    }

    #[test]
    fn remove_keeps_order_of_remaining_entries() {
        let (_, mut set) = local_set(4);
        let removed = set.remove("blob:yuletree/2").expect("entry present");
        assert_eq!(removed.uri.as_str(), "blob:yuletree/2");
        let uris: Vec<_> = set.entries().iter().map(|e| e.uri.as_str()).collect();
        assert_eq!(
            uris,
            ["blob:yuletree/1", "blob:yuletree/3", "blob:yuletree/4"]
        );
        assert!(set.remove("blob:yuletree/2").is_none());
    }

    #[test]
    fn release_happens_once() {
        let (mut registry, set) = local_set(2);
        let uri = set.uris()[1].clone();
        assert_eq!(registry.release(&uri), Some(PathBuf::from("photo-1.jpg")));
        assert_eq!(registry.release(&uri), None);
        assert_eq!(
            registry.release(&ResourceUri::External("https://x/y.png".into())),
            None
        );
        assert_eq!(registry.release(&set.uris()[0]), Some(PathBuf::from("photo-0.jpg")));
        assert_eq!(registry.live_handles(), 0);
    }

    #[test]
    fn revision_moves_only_on_mutation() {
        let (_, mut set) = local_set(2);
        let rev = set.revision();
        assert_eq!(set.extend(Vec::new()), 0);
        assert_eq!(set.revision(), rev);
        set.remove("missing");
        assert_eq!(set.revision(), rev);
        set.remove("blob:yuletree/1");
        assert_eq!(set.revision(), rev + 1);
    }
}
