pub mod services;
pub mod upload;

pub use services::{encode_image, stage_upload, EncodedImage};
pub use upload::ImageUpload;
