use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

use crate::event::{Event, EventDraft, EventId, EventPatch};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Io(#[from] io::Error),

    #[error("stored events are unreadable: {0}")]
    Corrupt(serde_json::Error),

    #[error("failed to serialize events: {0}")]
    Serialize(serde_json::Error),
}

/// Durable home for the serialized event list.
///
/// One value, replaced whole on every save.
pub trait Storage {
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&self, contents: &str) -> io::Result<()>;
}

/// A JSON file, replaced atomically via a sibling temp file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn load(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, contents: &str) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// In-process storage. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(contents.into()))),
        }
    }

    /// The last saved value.
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().map(|s| s.clone()).unwrap_or(None)
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.contents())
    }

    fn save(&self, contents: &str) -> io::Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| io::Error::other("memory storage poisoned"))?;
        *slot = Some(contents.to_string());
        Ok(())
    }
}

/// Ordered event list mirrored to [`Storage`] after every mutation.
pub struct EventStore<S> {
    events: Vec<Event>,
    next_id: EventId,
    storage: S,
}

impl<S: Storage> EventStore<S> {
    /// Rehydrates from storage. Missing storage yields an empty store.
    pub fn open(storage: S) -> Result<Self, StoreError> {
        let events: Vec<Event> = match storage.load()? {
            Some(raw) if !raw.trim().is_empty() => {
                serde_json::from_str(&raw).map_err(StoreError::Corrupt)?
            }
            _ => Vec::new(),
        };
        let next_id = events.iter().map(|e| e.id).max().map_or(1, |max| max + 1);
        debug!(count = events.len(), next_id, "Opened event store");

        Ok(Self {
            events,
            next_id,
            storage,
        })
    }

    pub fn list(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// First event whose title contains `needle`, case-insensitively.
    pub fn find_first(&self, needle: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.title_matches(needle))
    }

    /// Every event whose title contains `needle`, case-insensitively.
    pub fn find_all(&self, needle: &str) -> Vec<&Event> {
        self.events.iter().filter(|e| e.title_matches(needle)).collect()
    }

    pub fn add(&mut self, draft: EventDraft) -> Result<&Event, StoreError> {
        let id = self.allocate_id();
        self.events.push(draft.into_event(id));
        self.persist_or_rollback(|store| {
            store.events.pop();
            store.next_id = id;
        })?;
        Ok(&self.events[self.events.len() - 1])
    }

    /// Appends all drafts, persisting once. Returns the assigned ids in order.
    pub fn add_batch(
        &mut self,
        drafts: impl IntoIterator<Item = EventDraft>,
    ) -> Result<Vec<EventId>, StoreError> {
        let before = (self.events.len(), self.next_id);
        let mut ids = Vec::new();
        for draft in drafts {
            let id = self.allocate_id();
            self.events.push(draft.into_event(id));
            ids.push(id);
        }
        if !ids.is_empty() {
            self.persist_or_rollback(|store| {
                store.events.truncate(before.0);
                store.next_id = before.1;
            })?;
        }
        Ok(ids)
    }

    /// Applies `patch` to event `id`. Returns `None` if there is no such event.
    pub fn update(&mut self, id: EventId, patch: &EventPatch) -> Result<Option<&Event>, StoreError> {
        let Some(idx) = self.events.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        let previous = self.events[idx].clone();
        patch.apply(&mut self.events[idx]);
        self.persist_or_rollback(|store| store.events[idx] = previous)?;
        Ok(Some(&self.events[idx]))
    }

    /// Applies `patch` to every listed event, persisting once. Returns how many changed.
    pub fn update_many(&mut self, ids: &[EventId], patch: &EventPatch) -> Result<usize, StoreError> {
        let mut previous = Vec::new();
        for (idx, event) in self.events.iter_mut().enumerate() {
            if ids.contains(&event.id) {
                previous.push((idx, event.clone()));
                patch.apply(event);
            }
        }
        let count = previous.len();
        if count > 0 {
            self.persist_or_rollback(|store| {
                for (idx, event) in previous {
                    store.events[idx] = event;
                }
            })?;
        }
        Ok(count)
    }

    pub fn remove(&mut self, id: EventId) -> Result<Option<Event>, StoreError> {
        let Some(idx) = self.events.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        let removed = self.events.remove(idx);
        if let Err(e) = self.persist() {
            self.events.insert(idx, removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    fn allocate_id(&mut self) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Persists, undoing the in-memory change if the save fails.
    fn persist_or_rollback(&mut self, rollback: impl FnOnce(&mut Self)) -> Result<(), StoreError> {
        let result = self.persist();
        if result.is_err() {
            rollback(self);
        }
        result
    }

    fn persist(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.events).map_err(StoreError::Serialize)?;
        self.storage.save(&raw).inspect_err(|e| {
            warn!(error = %e, "Failed to persist events");
        })?;
        debug!(count = self.events.len(), "Persisted events");
        Ok(())
    }
}
