//! Scan task and result record types
//!
//! `DirectoryTask` is the unit of work flowing through the frontier;
//! `FileRecord` is the unit of output flowing through the result
//! channel. Records are immutable once built - ownership moves into
//! the channel on emission and then to the consumer.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A directory waiting to be expanded
#[derive(Debug, Clone)]
pub struct DirectoryTask {
    /// Full path to the directory
    pub path: PathBuf,

    /// Depth from the scan root (root = 0); drives the max-depth
    /// degrade and diagnostics, never ordering
    pub depth: u32,
}

impl DirectoryTask {
    /// Create a new directory task
    pub fn new(path: PathBuf, depth: u32) -> Self {
        Self { path, depth }
    }

    /// Create the root task
    pub fn root(path: PathBuf) -> Self {
        Self { path, depth: 0 }
    }
}

/// Metadata for a single matched file
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Full path to the file
    pub path: PathBuf,

    /// Parent directory path
    pub parent: PathBuf,

    /// File size in bytes
    pub size: u64,

    /// Last modification time (always available)
    pub modified: SystemTime,

    /// Creation time, if the filesystem supplies it
    pub created: Option<SystemTime>,

    /// Last access time, if the filesystem supplies it
    pub accessed: Option<SystemTime>,

    /// Read-only flag
    pub read_only: bool,

    /// Hidden flag (dot-prefixed name on Unix, attribute on Windows)
    pub hidden: bool,

    /// System flag (Windows attribute; always false elsewhere)
    pub system: bool,

    /// Always false for emitted records
    pub is_dir: bool,

    /// Depth from the scan root
    pub depth: u32,
}

impl FileRecord {
    /// Build a record from a path and its metadata
    ///
    /// Fails if the mandatory modification time is unavailable; the
    /// caller skips the file and moves on.
    pub fn from_metadata(path: PathBuf, depth: u32, metadata: &Metadata) -> io::Result<Self> {
        let modified = metadata.modified()?;
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let hidden = is_hidden(&path, metadata);
        let system = is_system(metadata);

        Ok(Self {
            path,
            parent,
            size: metadata.len(),
            modified,
            created: metadata.created().ok(),
            accessed: metadata.accessed().ok(),
            read_only: metadata.permissions().readonly(),
            hidden,
            system,
            is_dir: false,
            depth,
        })
    }

    /// File name component as a lossy string
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(unix)]
fn is_hidden(path: &Path, _metadata: &Metadata) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(windows)]
fn is_hidden(_path: &Path, metadata: &Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0
}

#[cfg(not(any(unix, windows)))]
fn is_hidden(_path: &Path, _metadata: &Metadata) -> bool {
    false
}

#[cfg(windows)]
fn is_system(metadata: &Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;
    metadata.file_attributes() & FILE_ATTRIBUTE_SYSTEM != 0
}

#[cfg(not(windows))]
fn is_system(_metadata: &Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_directory_task_root() {
        let task = DirectoryTask::root(PathBuf::from("/data"));
        assert_eq!(task.depth, 0);
        assert_eq!(task.path, PathBuf::from("/data"));
    }

    #[test]
    fn test_record_from_metadata() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("hello.txt");
        fs::write(&file_path, b"hello").unwrap();

        let metadata = fs::metadata(&file_path).unwrap();
        let record = FileRecord::from_metadata(file_path.clone(), 3, &metadata).unwrap();

        assert_eq!(record.path, file_path);
        assert_eq!(record.parent, dir.path());
        assert_eq!(record.size, 5);
        assert_eq!(record.depth, 3);
        assert!(!record.is_dir);
        assert!(!record.read_only);
        assert_eq!(record.file_name(), "hello.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_hidden_dotfile() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(".hidden");
        fs::write(&file_path, b"x").unwrap();

        let metadata = fs::metadata(&file_path).unwrap();
        let record = FileRecord::from_metadata(file_path, 1, &metadata).unwrap();
        assert!(record.hidden);
        assert!(!record.system);
    }
}
