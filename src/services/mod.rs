pub mod github;
pub mod upload;

pub use github::{TrafficClient, TrafficSnapshot};
pub use upload::UploadClient;
