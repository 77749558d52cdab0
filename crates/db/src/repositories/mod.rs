//! Repository layer: one zero-sized struct per table with async associated
//! functions taking a `&PgPool`.

pub mod artwork_image_repo;
pub mod category_repo;
pub mod setting_repo;

pub use artwork_image_repo::ArtworkImageRepo;
pub use category_repo::CategoryRepo;
pub use setting_repo::SettingRepo;
