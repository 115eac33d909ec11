//! Filesystem utilities for writing generated units

use crate::codegen::SourceUnit;
use std::fs;
use std::io;
use std::path::Path;

/// Write content to a file, creating parent directories if needed
pub fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> io::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, contents)
}

/// Write `unit` below `dir`; returns true if the file did not exist before
///
/// Existing files are overwritten.
pub fn write_unit(dir: &Path, unit: &SourceUnit) -> io::Result<bool> {
    let path = dir.join(&unit.path);
    let created = !path.exists();
    write_file(&path, &unit.contents)?;
    tracing::debug!(
        "{} {}",
        if created { "Created" } else { "Updated" },
        path.display()
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");
        write_file(&path, "hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_write_unit_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let first = SourceUnit::new("Account.cs", "one".to_string());
        let second = SourceUnit::new("Account.cs", "two".to_string());

        assert!(write_unit(dir.path(), &first).unwrap());
        assert!(!write_unit(dir.path(), &second).unwrap());
        assert_eq!(fs::read_to_string(dir.path().join("Account.cs")).unwrap(), "two");
    }
}
