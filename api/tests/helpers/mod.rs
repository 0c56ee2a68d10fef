pub mod app;
pub mod multipart;

pub use app::{body_json, body_text, make_app};
pub use multipart::{MultipartBuilder, zip_bytes};
