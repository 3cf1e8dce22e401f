//! Filesystem primitives used by the catalog and the mover.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Filesystem operations the archiver depends on.
///
/// Kept behind a trait so the session can be driven against an in-memory
/// tree in tests.
pub trait Filesystem: Send + Sync {
    /// `Ok(false)` only when the path is definitely absent.
    fn exists(&self, path: &Path) -> io::Result<bool>;

    fn is_dir(&self, path: &Path) -> io::Result<bool>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Immediate child directories of `root` as `(name, path)`, in enumeration order.
    fn list_child_directories(&self, root: &Path) -> io::Result<Vec<(String, PathBuf)>>;

    /// Move the directory tree at `src` to `dst`, creating `dst`'s parents as needed.
    fn move_directory(&self, src: &Path, dst: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(fs::metadata(path)?.is_dir())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn list_child_directories(&self, root: &Path) -> io::Result<Vec<(String, PathBuf)>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            // file_type() does not follow symlinks, so linked directories are skipped.
            if entry.file_type()?.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                out.push((name, entry.path()));
            }
        }
        Ok(out)
    }

    fn move_directory(&self, src: &Path, dst: &Path) -> io::Result<()> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        match fs::rename(src, dst) {
            Ok(()) => Ok(()),
            Err(e) if is_cross_device(&e) => copy_then_swap(src, dst),
            Err(e) => Err(e),
        }
    }
}

fn is_cross_device(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices
}

/// Cross-device move: copy into a staging directory next to `dst`, rename it
/// into place, then retire the source. Until the source is retired every
/// failure rolls back to the original layout.
fn copy_then_swap(src: &Path, dst: &Path) -> io::Result<()> {
    let staging = sibling_with_suffix(dst, "arpo-partial")?;
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }

    let placed = copy_tree(src, &staging).and_then(|()| fs::rename(&staging, dst));
    if let Err(e) = placed {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    // Renaming the source aside is a same-device operation and cannot half-fail.
    let retired = sibling_with_suffix(src, "arpo-retired")?;
    if let Err(e) = fs::rename(src, &retired) {
        let _ = fs::remove_dir_all(dst);
        return Err(e);
    }
    let _ = fs::remove_dir_all(&retired);
    Ok(())
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> io::Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let hidden = format!(".{}.{suffix}", name.to_string_lossy());
    Ok(path.with_file_name(hidden))
}

fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(rel);
        let ft = entry.file_type();
        if ft.is_dir() {
            fs::create_dir_all(&target)?;
        } else if ft.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else if ft.is_file() {
            fs::copy(entry.path(), &target)?;
        } else {
            // Sockets, FIFOs and device nodes.
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot copy special file {}", entry.path().display()),
            ));
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lists_only_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("alpha")).unwrap();
        fs::create_dir(tmp.path().join("beta")).unwrap();
        fs::write(tmp.path().join("notes.txt"), b"x").unwrap();

        let mut dirs = LocalFs.list_child_directories(tmp.path()).unwrap();
        dirs.sort();
        assert_eq!(
            dirs,
            vec![
                ("alpha".to_string(), tmp.path().join("alpha")),
                ("beta".to_string(), tmp.path().join("beta")),
            ]
        );
    }

    #[test]
    fn exists_distinguishes_missing_paths() {
        let tmp = TempDir::new().unwrap();
        assert!(LocalFs.exists(tmp.path()).unwrap());
        assert!(!LocalFs.exists(&tmp.path().join("nope")).unwrap());
    }

    #[test]
    fn move_directory_creates_parents_and_keeps_contents() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("proj");
        fs::create_dir_all(src.join("src")).unwrap();
        fs::write(src.join("src/main.rs"), b"fn main() {}").unwrap();
        let dst = tmp.path().join("deep/archive/proj");

        LocalFs.move_directory(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(dst.join("src/main.rs")).unwrap(), b"fn main() {}");
    }

    #[test]
    fn copy_then_swap_moves_tree_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("proj");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::write(src.join("a/b/file"), b"data").unwrap();
        fs::write(src.join("top"), b"top").unwrap();
        let dst = tmp.path().join("proj-moved");

        copy_then_swap(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(dst.join("a/b/file")).unwrap(), b"data");
        assert_eq!(fs::read(dst.join("top")).unwrap(), b"top");
        assert!(!tmp.path().join(".proj-moved.arpo-partial").exists());
        assert!(!tmp.path().join(".proj.arpo-retired").exists());
    }

    #[test]
    fn cross_device_is_recognised_by_kind() {
        assert!(is_cross_device(&io::Error::from(io::ErrorKind::CrossesDevices)));
        assert!(!is_cross_device(&io::Error::from(
            io::ErrorKind::PermissionDenied
        )));
    }

    #[cfg(unix)]
    #[test]
    fn copy_then_swap_refuses_special_files() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("proj");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("keep"), b"k").unwrap();
        let _listener = std::os::unix::net::UnixListener::bind(src.join("daemon.sock")).unwrap();
        let dst = tmp.path().join("out");

        let err = copy_then_swap(&src, &dst).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert!(src.join("keep").exists());
        assert!(!dst.exists());
        assert!(!tmp.path().join(".out.arpo-partial").exists());
    }

    #[test]
    fn copy_then_swap_rolls_back_when_source_is_missing() {
        let tmp = TempDir::new().unwrap();
        let dst = tmp.path().join("out");
        assert!(copy_then_swap(&tmp.path().join("missing"), &dst).is_err());
        assert!(!dst.exists());
        assert!(!tmp.path().join(".out.arpo-partial").exists());
    }
}
