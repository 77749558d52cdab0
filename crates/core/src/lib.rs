//! Atelier domain core.
//!
//! Pure, database-free logic for the gallery content system: flat page
//! settings and the repeating groups derived from them, ordered image
//! collections with a single primary image, unsaved-edit tracking, and the
//! category taxonomy. The `db`, `api` and `editor` crates all build on the
//! types defined here.

pub mod assets;
pub mod change_tracker;
pub mod error;
pub mod groups;
pub mod markup;
pub mod reorder;
pub mod settings;
pub mod taxonomy;
pub mod types;
