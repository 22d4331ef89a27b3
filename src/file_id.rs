//! File identity and size snapshots used to tell growth, truncation and replacement apart.

use std::fmt;
use std::fs::Metadata;

/// A filesystem-unique identifier for a file.
///
/// On Unix this is the device ID + inode number, which survives renames. Other platforms get a
/// constant identity, leaving only size-based truncation detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    pub fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        }
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Self {
        Self { dev: 0, ino: 0 }
    }

    pub fn dev(&self) -> u64 {
        self.dev
    }

    pub fn ino(&self) -> u64 {
        self.ino
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dev, self.ino)
    }
}

/// Identity and length of a file as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FileSnapshot {
    pub(crate) id: FileId,
    pub(crate) len: u64,
}

impl FileSnapshot {
    pub(crate) fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            id: FileId::from_metadata(metadata),
            len: metadata.len(),
        }
    }

    pub(crate) fn same_file(&self, other: &FileSnapshot) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TempLogFile;

    #[test]
    fn test_file_id_display() {
        let id = FileId::new(123, 456);
        assert_eq!(format!("{}", id), "123:456");
        assert_eq!(id.dev(), 123);
        assert_eq!(id.ino(), 456);
    }

    #[test]
    fn test_snapshot_tracks_length() {
        let temp_file = TempLogFile::with_content("hello").unwrap();
        let metadata = std::fs::metadata(temp_file.path()).unwrap();
        let snapshot = FileSnapshot::from_metadata(&metadata);

        assert_eq!(snapshot.len, 6);
    }

    #[test]
    fn test_identity_stable_across_append() {
        let temp_file = TempLogFile::with_content("first").unwrap();
        let before = FileSnapshot::from_metadata(&std::fs::metadata(temp_file.path()).unwrap());

        temp_file.append_content("second").unwrap();
        let after = FileSnapshot::from_metadata(&std::fs::metadata(temp_file.path()).unwrap());

        assert!(before.same_file(&after));
        assert!(after.len > before.len);
    }

    #[cfg(unix)]
    #[test]
    fn test_identity_changes_on_rotation() {
        let temp_file = TempLogFile::with_content("old").unwrap();
        let before = FileSnapshot::from_metadata(&std::fs::metadata(temp_file.path()).unwrap());

        // The rotated file still exists, so the new inode cannot be a reused one.
        temp_file.rotate().unwrap();
        let after = FileSnapshot::from_metadata(&std::fs::metadata(temp_file.path()).unwrap());

        assert!(!before.same_file(&after));
        assert_eq!(after.len, 0);
    }
}
