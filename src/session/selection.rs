use crate::model::Entry;
use std::collections::HashSet;
use std::sync::Arc;

/// The loaded catalog plus the names the user has marked.
#[derive(Debug, Clone)]
pub struct Selection {
    catalog: Vec<Arc<Entry>>,
    marked: HashSet<String>,
}

impl Selection {
    pub fn new(catalog: Vec<Arc<Entry>>) -> Self {
        Self {
            catalog,
            marked: HashSet::new(),
        }
    }

    pub fn entries(&self) -> &[Arc<Entry>] {
        &self.catalog
    }

    pub fn is_marked(&self, name: &str) -> bool {
        self.marked.contains(name)
    }

    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    /// Flip `name` in or out of the selection. Names not in the catalog are ignored.
    pub fn toggle(&mut self, name: &str) {
        if !self.catalog.iter().any(|e| e.name == name) {
            return;
        }
        if !self.marked.remove(name) {
            self.marked.insert(name.to_string());
        }
    }

    /// Toggle by row position; out-of-range rows are ignored.
    pub fn toggle_row(&mut self, id: usize) {
        if let Some(entry) = self.catalog.get(id).cloned() {
            self.toggle(&entry.name);
        }
    }

    /// Freeze the selection. Entries come back in catalog order, not marking order.
    pub fn commit(self) -> Vec<Arc<Entry>> {
        let Selection { catalog, marked } = self;
        catalog
            .into_iter()
            .filter(|e| marked.contains(&e.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> Vec<Arc<Entry>> {
        names
            .iter()
            .map(|n| Arc::new(Entry::new(*n, format!("/dev/{n}"))))
            .collect()
    }

    fn committed(sel: Selection) -> Vec<String> {
        sel.commit().iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn commit_returns_catalog_order_regardless_of_toggle_order() {
        let names = ["a", "b", "c", "d", "e"];
        let orders: [&[&str]; 3] = [&["e", "a", "c"], &["c", "e", "a"], &["a", "c", "e"]];
        for order in orders {
            let mut sel = Selection::new(catalog(&names));
            for n in order {
                sel.toggle(n);
            }
            assert_eq!(committed(sel), vec!["a", "c", "e"]);
        }
    }

    #[test]
    fn toggling_twice_unmarks() {
        let mut sel = Selection::new(catalog(&["a", "b"]));
        sel.toggle("a");
        sel.toggle("b");
        sel.toggle("a");
        assert!(!sel.is_marked("a"));
        assert_eq!(sel.marked_count(), 1);
        assert_eq!(committed(sel), vec!["b"]);
    }

    #[test]
    fn unknown_names_and_rows_are_ignored() {
        let mut sel = Selection::new(catalog(&["a"]));
        sel.toggle("zzz");
        sel.toggle_row(7);
        assert_eq!(sel.marked_count(), 0);
        sel.toggle_row(0);
        assert!(sel.is_marked("a"));
    }

    #[test]
    fn empty_commit_is_valid() {
        let sel = Selection::new(catalog(&["a", "b"]));
        assert!(sel.commit().is_empty());
    }

    #[test]
    fn committed_entries_share_catalog_allocations() {
        let cat = catalog(&["a", "b"]);
        let first = Arc::clone(&cat[0]);
        let mut sel = Selection::new(cat);
        sel.toggle("a");
        let work = sel.commit();
        assert!(Arc::ptr_eq(&work[0], &first));
    }
}
