use super::fs::Filesystem;
use crate::error::CatalogLoadError;
use crate::model::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which child directories of the root are offered for archiving.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Skipped when it appears as a child of the root (normally the archive folder).
    pub exclude: Option<PathBuf>,
    pub include_hidden: bool,
}

impl CatalogFilter {
    fn accepts(&self, name: &str, path: &Path) -> bool {
        if !self.include_hidden && name.starts_with('.') {
            return false;
        }
        self.exclude.as_deref() != Some(path)
    }
}

pub struct ProjectCatalog;

impl ProjectCatalog {
    /// List the immediate child directories of `root`, sorted by name.
    pub fn load(
        fs: &dyn Filesystem,
        root: &Path,
        filter: &CatalogFilter,
    ) -> Result<Vec<Arc<Entry>>, CatalogLoadError> {
        let unreadable = |source| CatalogLoadError::Unreadable {
            path: root.to_path_buf(),
            source,
        };

        if !fs.is_dir(root).map_err(unreadable)? {
            return Err(CatalogLoadError::NotADirectory(root.to_path_buf()));
        }

        let mut entries: Vec<Arc<Entry>> = fs
            .list_child_directories(root)
            .map_err(unreadable)?
            .into_iter()
            .filter(|(name, path)| filter.accepts(name, path))
            .map(|(name, path)| Arc::new(Entry::new(name, path)))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
