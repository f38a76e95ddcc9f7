//! HTTP handlers for formlab-api.

pub mod health;
pub mod sports;
pub mod videos;

pub use health::{health, ready, root};
pub use sports::{get_sport, list_sports};
pub use videos::{delete_video, get_results, get_status, upload_video};
