use protocol::FileType;

/// One captured file: the index is the position in the store at the
/// moment of listing, so it is derived, never stored.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_type: FileType,
    pub timestamp_unix: f64,
    pub payload: Vec<u8>,
}

/// Per-server in-memory list of captured images, videos, and motion data
/// (spec.md §3). Mutated only from the dispatcher task, so no internal
/// locking is needed (spec.md §5's "Shared-resource policy").
#[derive(Debug, Default)]
pub struct FileStore {
    files: Vec<StoredFile>,
}

impl FileStore {
    pub fn new() -> Self {
        FileStore::default()
    }

    pub fn push(&mut self, file: StoredFile) {
        self.files.push(file);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&StoredFile> {
        self.files.get(index as usize)
    }

    pub fn iter_with_index(&self) -> impl Iterator<Item = (u32, &StoredFile)> {
        self.files.iter().enumerate().map(|(i, f)| (i as u32, f))
    }

    /// `CLEAR`: empties the list and resets indexing.
    pub fn clear(&mut self) {
        self.files.clear();
    }
}
