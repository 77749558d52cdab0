//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` request DTOs for the writes the table supports

pub mod artwork_image;
pub mod category;
pub mod setting;
