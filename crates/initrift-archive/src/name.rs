//! Archive filenames derived from host paths.

use std::path::{Component, Path};

use crate::entry::encode_text;
use crate::{CpioError, Result};

/// Compute the archive filename for `path`.
///
/// With a `root`, the root prefix is stripped. Without one the path is used
/// as given. Leading separators are dropped, components are joined with `/`
/// and an empty result becomes `.`.
pub fn archive_name(path: &Path, root: Option<&Path>) -> Result<Vec<u8>> {
    let relative = match root {
        Some(root) => path
            .strip_prefix(root)
            .map_err(|_| CpioError::OutsideRoot {
                path: path.to_path_buf(),
                root: root.to_path_buf(),
            })?,
        None => path,
    };

    let mut name = Vec::new();
    for component in relative.components() {
        let part = match component {
            Component::RootDir | Component::Prefix(_) => continue,
            other => other.as_os_str(),
        };
        if !name.is_empty() {
            name.push(b'/');
        }
        name.extend_from_slice(&encode_text(path, part)?);
    }

    if name.is_empty() {
        name.push(b'.');
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    fn name(path: &str, root: Option<&str>) -> String {
        let bytes = archive_name(Path::new(path), root.map(Path::new)).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_root_is_stripped() {
        assert_eq!(name("/srv/rootfs/bin/sh", Some("/srv/rootfs")), "bin/sh");
        assert_eq!(name("rootfs/etc", Some("rootfs")), "etc");
    }

    #[test]
    fn test_root_itself_is_dot() {
        assert_eq!(name("/srv/rootfs", Some("/srv/rootfs")), ".");
        assert_eq!(name("/", None), ".");
    }

    #[test]
    fn test_legacy_mode_drops_leading_slash() {
        assert_eq!(name("/etc/passwd", None), "etc/passwd");
        assert_eq!(name("./init", None), "./init");
        assert_eq!(name("usr//lib/", None), "usr/lib");
    }

    #[test]
    fn test_outside_root() {
        let err = archive_name(Path::new("/etc/passwd"), Some(Path::new("/srv"))).unwrap_err();
        assert!(matches!(err, CpioError::OutsideRoot { .. }));
    }

    #[test]
    fn test_non_utf8_name_rejected() {
        let path = Path::new(OsStr::from_bytes(b"bad\xffname"));
        let err = archive_name(path, None).unwrap_err();
        assert!(matches!(err, CpioError::InvalidEncoding { .. }));
    }
}
