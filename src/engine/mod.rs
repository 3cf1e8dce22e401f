//! Side-effecting workers: directory enumeration and relocation.
//!
//! Everything here is blocking I/O and is run off the controller loop.
//! Nothing in this module logs; errors are returned to the caller as-is.

mod catalog;
mod fs;
mod mover;

pub use catalog::{CatalogFilter, ProjectCatalog};
pub use fs::{Filesystem, LocalFs};
pub use mover::Mover;
