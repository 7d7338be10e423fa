//! Write-then-rename file replacement.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Replaces `path` with `data` so readers observe either the old or the new contents.
///
/// Bytes go to `{path}.tmp` first, are synced, then renamed over `path`.
/// Missing parent directories are created.
pub(crate) fn write_atomically(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temporary = temporary_path(path);
    let mut file = File::create(&temporary)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&temporary, path)
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parent_directories_and_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/deeper/layout.json");

        write_atomically(&path, b"first").expect("write");

        assert_eq!(fs::read(&path).expect("read"), b"first");
        assert!(!temporary_path(&path).exists());
    }

    #[test]
    fn overwrites_previous_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("layout.json");

        write_atomically(&path, b"version 1").expect("first write");
        write_atomically(&path, b"version 2").expect("second write");

        assert_eq!(fs::read(&path).expect("read"), b"version 2");
    }

    #[test]
    fn stale_temporary_file_does_not_block_writes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("layout.json");
        fs::write(temporary_path(&path), b"garbage").expect("stale temp");

        write_atomically(&path, b"fresh").expect("write");

        assert_eq!(fs::read(&path).expect("read"), b"fresh");
    }
}
