pub mod artwork_images;
pub mod categories;
pub mod settings;
