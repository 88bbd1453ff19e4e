pub mod catalog_loader;

pub use catalog_loader::{derive_identifier, image_content_type, is_image_file, load_catalog};
