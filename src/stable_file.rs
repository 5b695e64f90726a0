//! Content-stable file writing.
//!
//! Every artifact the generator produces goes through a [`StableFile`]: the
//! full contents are buffered in memory and only flushed to disk when they
//! differ from what is already there. Unchanged files keep their
//! modification time, which is what lets repeated generator runs be no-ops
//! for the build tool consuming the output.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

/// A buffered writer that only touches disk when contents change.
#[derive(Debug)]
pub struct StableFile {
    path: Utf8PathBuf,
    data: Vec<u8>,
    executable: bool,
}

impl StableFile {
    /// Open a buffer destined for `path`. Nothing is created on disk yet.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: Vec::new(),
            executable: false,
        }
    }

    /// Append text to the buffer.
    pub fn write_str(&mut self, text: &str) {
        self.data.extend_from_slice(text.as_bytes());
    }

    /// Append raw bytes to the buffer.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Request the run-permission bit on the committed file.
    pub fn set_executable(&mut self, executable: bool) {
        self.executable = executable;
    }

    /// The destination path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The buffered contents accumulated so far.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Flush the buffer to disk, creating parent directories on demand.
    ///
    /// Returns `true` when the file was written and `false` when the
    /// existing contents already matched, in which case the file's
    /// modification time is left untouched. The executable bit is enforced
    /// either way so a stripped permission heals on the next run.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from reading the previous contents, creating
    /// directories, writing, or setting permissions.
    pub fn commit(self) -> io::Result<bool> {
        let unchanged = match fs::read(&self.path) {
            Ok(existing) => existing == self.data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => false,
            Err(err) => return Err(err),
        };
        if !unchanged {
            if let Some(dir) = self.path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(&self.path, &self.data)?;
        }
        if self.executable {
            set_run_permission(&self.path)?;
        }
        Ok(!unchanged)
    }
}

#[cfg(unix)]
fn set_run_permission(path: &Utf8Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_run_permission(_path: &Utf8Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir")
    }

    #[rstest]
    fn creates_parent_directories() {
        let dir = TempDir::new().expect("temp dir");
        let path = utf8(&dir).join("nested/deeper/out.txt");
        let mut file = StableFile::new(path.clone());
        file.write_str("hello\n");
        assert!(file.commit().expect("commit"));
        assert_eq!(fs::read_to_string(path).expect("read back"), "hello\n");
    }

    #[rstest]
    fn identical_content_skips_the_write() {
        let dir = TempDir::new().expect("temp dir");
        let path = utf8(&dir).join("out.txt");
        let mut first = StableFile::new(path.clone());
        first.write_str("stable contents\n");
        assert!(first.commit().expect("first commit"));
        let before = fs::metadata(&path).expect("metadata").modified().expect("mtime");

        std::thread::sleep(std::time::Duration::from_millis(20));
        let mut second = StableFile::new(path.clone());
        second.write_str("stable contents\n");
        assert!(!second.commit().expect("second commit"));
        let after = fs::metadata(&path).expect("metadata").modified().expect("mtime");
        assert_eq!(before, after);
    }

    #[rstest]
    fn changed_content_rewrites() {
        let dir = TempDir::new().expect("temp dir");
        let path = utf8(&dir).join("out.txt");
        let mut first = StableFile::new(path.clone());
        first.write_str("one\n");
        first.commit().expect("first commit");
        let mut second = StableFile::new(path.clone());
        second.write_str("two\n");
        assert!(second.commit().expect("second commit"));
        assert_eq!(fs::read_to_string(path).expect("read back"), "two\n");
    }

    #[cfg(unix)]
    #[rstest]
    fn executable_bit_is_applied() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().expect("temp dir");
        let path = utf8(&dir).join("run.sh");
        let mut file = StableFile::new(path.clone());
        file.write_str("#!/bin/sh\n");
        file.set_executable(true);
        file.commit().expect("commit");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
