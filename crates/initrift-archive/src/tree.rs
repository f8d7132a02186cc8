//! Whole-directory injection on the host filesystem.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::session::CpioSession;
use crate::source::HostFs;
use crate::{CpioError, Result};

impl<W: Write> CpioSession<W, HostFs> {
    /// Archive `root` and everything below it, named relative to `root`.
    ///
    /// The root itself becomes `.`. Directories come before their contents
    /// and siblings are visited in file-name order, so the same tree always
    /// produces the same archive. Symlinks are archived, not followed.
    /// Returns the number of paths submitted.
    pub fn inject_tree(&mut self, root: impl AsRef<Path>) -> Result<u64> {
        self.ensure_open()?;
        let result = self.inject_tree_entries(root.as_ref());
        self.track(result)
    }

    fn inject_tree_entries(&mut self, root: &Path) -> Result<u64> {
        let md = fs::symlink_metadata(root).map_err(|e| CpioError::at(root, e))?;
        if !md.is_dir() {
            return Err(CpioError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        debug!(root = %root.display(), "Injecting tree");

        self.inject(root, Some(root))?;
        let mut count = 1;

        for entry in WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(root).to_path_buf();
                CpioError::at(path, err.into())
            })?;
            self.inject(entry.path(), Some(root))?;
            count += 1;
        }

        debug!(root = %root.display(), paths = count, "Tree injected");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_symlink_root_rejected() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut session = CpioSession::new(Vec::new());
        let err = session.inject_tree(&link).unwrap_err();
        assert!(matches!(err, CpioError::NotADirectory { .. }));
    }

    #[test]
    fn test_file_root_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        std::fs::write(&file, b"x").unwrap();

        let mut session = CpioSession::new(Vec::new());
        assert!(matches!(
            session.inject_tree(&file).unwrap_err(),
            CpioError::NotADirectory { .. }
        ));
    }

    #[test]
    fn test_counts_paths() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("etc/init.d")).unwrap();
        std::fs::write(temp.path().join("etc/hostname"), b"box\n").unwrap();

        let mut session = CpioSession::new(Vec::new());
        assert_eq!(session.inject_tree(temp.path()).unwrap(), 4);
        let summary = session.finalize().unwrap();
        assert_eq!(summary.records, 4);
    }
}
