//! Outbound collaborators on the hosting platform: object storage for
//! product images and the public link shortener used at checkout.

pub mod error;
pub mod shortener;
pub mod storage;

pub use error::PlatformError;
pub use shortener::LinkShortener;
pub use storage::{object_path_for, StorageClient, UploadedImage};
