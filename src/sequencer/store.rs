//! Persistence backends for the request counter.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use super::SequencerError;

/// Durable storage for the next request identifier.
pub trait CounterStore: Send + 'static {
    /// Read the stored counter, or `None` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError`] if the backing medium cannot be read.
    fn load(&mut self) -> Result<Option<u32>, SequencerError>;

    /// Persist `value` as the next counter.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError`] if the value cannot be written.
    fn store(&mut self, value: u32) -> Result<(), SequencerError>;
}

/// In-process counter; clones share the same value.
#[derive(Clone, Debug, Default)]
pub struct MemoryCounterStore {
    value: Arc<Mutex<Option<u32>>>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create a store pre-loaded with `value`.
    #[must_use]
    pub fn with_value(value: u32) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(value))),
        }
    }

    /// Currently stored value.
    #[must_use]
    pub fn value(&self) -> Option<u32> { *self.lock() }

    fn lock(&self) -> MutexGuard<'_, Option<u32>> {
        self.value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CounterStore for MemoryCounterStore {
    fn load(&mut self) -> Result<Option<u32>, SequencerError> { Ok(*self.lock()) }

    fn store(&mut self, value: u32) -> Result<(), SequencerError> {
        *self.lock() = Some(value);
        Ok(())
    }
}

/// Counter kept as decimal text in a file.
///
/// Writes go to a sibling temporary file that is renamed over the target, so
/// a crash mid-write leaves the previous value intact.
#[derive(Clone, Debug)]
pub struct FileCounterStore {
    path: PathBuf,
}

impl FileCounterStore {
    /// Use the counter file at `path`. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    /// Location of the counter file.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(ToOwned::to_owned).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CounterStore for FileCounterStore {
    fn load(&mut self) -> Result<Option<u32>, SequencerError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SequencerError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let trimmed = text.trim();
        trimmed
            .parse()
            .map(Some)
            .map_err(|_| SequencerError::Corrupt {
                path: self.path.clone(),
                contents: trimmed.to_owned(),
            })
    }

    fn store(&mut self, value: u32) -> Result<(), SequencerError> {
        let temp = self.temp_path();
        fs::write(&temp, value.to_string())
            .and_then(|()| fs::rename(&temp, &self.path))
            .map_err(|source| SequencerError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
