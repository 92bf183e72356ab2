//! Catalog types and persistence.
//!
//! The catalog is the only persisted state: a flat, ordered list of
//! resources keyed by label. Integrity (label uniqueness) is enforced on
//! insertion; everything else is up to the engine.

pub mod resource;
pub mod store;
pub mod types;

pub use resource::{Resource, ResourcePatch, now};
pub use store::ManifestStore;
pub use types::{Catalog, MANIFEST_VERSION};
