use super::fs::Filesystem;
use crate::error::MoveError;
use crate::model::Entry;
use std::path::Path;
use std::time::{Duration, Instant};

pub struct Mover;

impl Mover {
    /// Relocate `entry` into `destination_root`, returning wall-clock time for the whole call.
    pub fn relocate(
        fs: &dyn Filesystem,
        entry: &Entry,
        destination_root: &Path,
    ) -> Result<Duration, MoveError> {
        let start = Instant::now();

        ensure_destination(fs, destination_root)?;

        let target = destination_root.join(&entry.name);
        let relocate_failed = |source| MoveError::Relocate {
            from: entry.source_path.clone(),
            to: target.clone(),
            source,
        };

        if fs.exists(&target).map_err(relocate_failed)? {
            return Err(MoveError::TargetExists(target.clone()));
        }
        if !fs.exists(&entry.source_path).map_err(relocate_failed)? {
            return Err(MoveError::SourceMissing(entry.source_path.clone()));
        }

        fs.move_directory(&entry.source_path, &target)
            .map_err(relocate_failed)?;

        Ok(start.elapsed())
    }
}

/// Create-if-absent; refuses to reuse a path occupied by something other than a directory.
fn ensure_destination(fs: &dyn Filesystem, root: &Path) -> Result<(), MoveError> {
    let create_failed = |source| MoveError::CreateDestination {
        path: root.to_path_buf(),
        source,
    };

    if fs.exists(root).map_err(create_failed)? {
        if !fs.is_dir(root).map_err(create_failed)? {
            return Err(MoveError::DestinationNotDirectory(root.to_path_buf()));
        }
        return Ok(());
    }
    fs.create_dir_all(root).map_err(create_failed)
}
