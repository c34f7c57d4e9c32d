//! JSON-file storage for farm records.
//!
//! Each collection lives in `<root>/<collection>.json` as a single JSON
//! array. Records are kept as raw [`serde_json::Value`]s; shaping them
//! into typed records is the caller's business.

mod error;

pub use error::StoreError;

use lru::LruCache;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::{debug, info};

const CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(Collection::ALL.len()) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Named record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Farms.
    Farms,
    /// Crop plantings.
    Crops,
    /// Tasks.
    Tasks,
    /// Expenses.
    Expenses,
    /// Income.
    Income,
    /// Weather forecast days.
    Weather,
}

impl Collection {
    /// Every collection.
    pub const ALL: [Self; 6] = [
        Self::Farms,
        Self::Crops,
        Self::Tasks,
        Self::Expenses,
        Self::Income,
        Self::Weather,
    ];

    /// Collection name as used in file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Farms => "farms",
            Self::Crops => "crops",
            Self::Tasks => "tasks",
            Self::Expenses => "expenses",
            Self::Income => "income",
            Self::Weather => "weather",
        }
    }

    fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|collection| collection.as_str() == wanted)
            .ok_or_else(|| StoreError::UnknownCollection(s.to_owned()))
    }
}

#[derive(Clone)]
struct CachedCollection {
    modified: Option<SystemTime>,
    records: Arc<Vec<Value>>,
}

/// Storage rooted at a data directory.
#[derive(Clone)]
pub struct JsonStore {
    root: PathBuf,
    cache: Arc<Mutex<LruCache<Collection, CachedCollection>>>,
}

impl fmt::Debug for JsonStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonStore").field("root", &self.root).finish_non_exhaustive()
    }
}

impl JsonStore {
    /// Open (and create if needed) the data directory.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        info!(root = %root.display(), "opened record store");
        Ok(Self {
            root,
            cache: Arc::new(Mutex::new(LruCache::new(CACHE_CAPACITY))),
        })
    }

    /// Data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a collection.
    #[must_use]
    pub fn path_of(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.file_name())
    }

    /// Load every record of a collection. A missing file is an empty collection.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a JSON array.
    pub fn load(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        let path = self.path_of(collection);
        let modified = match fs::metadata(&path) {
            Ok(meta) => meta.modified().ok(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(%collection, "collection file missing; treating as empty");
                return Ok(Vec::new());
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        if let Some(records) = self.cached(collection, modified)? {
            return Ok(records.as_ref().clone());
        }

        let contents = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let records = parse_collection(&path, &contents)?;
        debug!(%collection, count = records.len(), "loaded collection");
        self.remember(collection, modified, records.clone())?;
        Ok(records)
    }

    /// Replace every record of a collection.
    ///
    /// The payload is written to a sibling temporary file first and then
    /// renamed over the collection file.
    ///
    /// # Errors
    /// Returns an error if encoding or any file operation fails.
    pub fn save(&self, collection: Collection, records: &[Value]) -> StoreResult<()> {
        let path = self.path_of(collection);
        let body = serde_json::to_string_pretty(records).map_err(StoreError::Serialize)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let modified = fs::metadata(&path).ok().and_then(|meta| meta.modified().ok());
        self.remember(collection, modified, records.to_vec())?;
        info!(%collection, count = records.len(), "saved collection");
        Ok(())
    }

    fn cached(
        &self,
        collection: Collection,
        modified: Option<SystemTime>,
    ) -> StoreResult<Option<Arc<Vec<Value>>>> {
        let mut cache = self.cache.lock().map_err(|_| StoreError::LockError)?;
        Ok(cache
            .get(&collection)
            .filter(|entry| entry.modified.is_some() && entry.modified == modified)
            .map(|entry| Arc::clone(&entry.records)))
    }

    fn remember(
        &self,
        collection: Collection,
        modified: Option<SystemTime>,
        records: Vec<Value>,
    ) -> StoreResult<()> {
        let mut cache = self.cache.lock().map_err(|_| StoreError::LockError)?;
        cache.put(
            collection,
            CachedCollection {
                modified,
                records: Arc::new(records),
            },
        );
        Ok(())
    }
}

fn parse_collection(path: &Path, contents: &str) -> StoreResult<Vec<Value>> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(contents).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Array(records) => Ok(records),
        _ => Err(StoreError::NotAnArray {
            path: path.to_path_buf(),
        }),
    }
}
