//! Test utilities for creating and manipulating temporary log files.

#[cfg(test)]
use std::fs::{File, OpenOptions};
#[cfg(test)]
use std::io::Write;
#[cfg(test)]
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use crate::config::TailConfig;

#[cfg(test)]
pub struct TempLogFile {
    pub path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

#[cfg(test)]
impl TempLogFile {
    /// Create a new empty temporary log file
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("test.log");

        File::create(&path)?;

        Ok(Self {
            path,
            _temp_dir: temp_dir,
        })
    }

    /// Create a temporary log file with one initial line
    pub fn with_content(content: &str) -> std::io::Result<Self> {
        let temp_file = Self::new()?;
        temp_file.append_content(content)?;
        Ok(temp_file)
    }

    /// Append a line (newline added)
    pub fn append_content(&self, content: &str) -> std::io::Result<()> {
        self.write_raw(&format!("{}\n", content))
    }

    /// Append bytes exactly as given
    pub fn write_raw(&self, content: &str) -> std::io::Result<()> {
        self.write_bytes(content.as_bytes())
    }

    pub fn write_bytes(&self, content: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(content)?;
        file.flush()?;
        Ok(())
    }

    /// Truncate the file in place, keeping its identity
    pub fn truncate(&self) -> std::io::Result<()> {
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        Ok(())
    }

    /// Rename the file to `<name>.1` and create an empty file in its place
    pub fn rotate(&self) -> std::io::Result<PathBuf> {
        let rotated = self.rotated_path();
        std::fs::rename(&self.path, &rotated)?;
        File::create(&self.path)?;
        Ok(rotated)
    }

    pub fn remove(&self) -> std::io::Result<()> {
        std::fs::remove_file(&self.path)
    }

    /// Create the file again (after `remove`) with raw content
    pub fn recreate(&self, content: &str) -> std::io::Result<()> {
        let mut file = File::create(&self.path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub fn rotated_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".1");
        PathBuf::from(name)
    }

    /// Get the path to the temporary file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Short intervals so rotation and deletion scenarios finish quickly
#[cfg(test)]
pub fn fast_config() -> TailConfig {
    TailConfig::new(Duration::from_millis(20), Duration::from_millis(300))
}

/// Upper bound for a single read in tests
#[cfg(test)]
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_log_file_creation() {
        let temp_file = TempLogFile::new().unwrap();
        assert!(temp_file.path().exists());
    }

    #[tokio::test]
    async fn test_append_and_raw_write() {
        let temp_file = TempLogFile::with_content("line 1").unwrap();
        temp_file.write_raw("par").unwrap();
        temp_file.write_raw("tial").unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "line 1\npartial");
    }

    #[tokio::test]
    async fn test_truncate() {
        let temp_file = TempLogFile::with_content("initial content").unwrap();
        temp_file.truncate().unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn test_rotate_keeps_old_content_aside() {
        let temp_file = TempLogFile::with_content("old").unwrap();
        let rotated = temp_file.rotate().unwrap();

        assert_eq!(std::fs::read_to_string(&rotated).unwrap(), "old\n");
        assert!(std::fs::read_to_string(temp_file.path()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_and_recreate() {
        let temp_file = TempLogFile::with_content("old").unwrap();
        temp_file.remove().unwrap();
        assert!(!temp_file.path().exists());

        temp_file.recreate("new\n").unwrap();
        assert_eq!(std::fs::read_to_string(temp_file.path()).unwrap(), "new\n");
    }
}
