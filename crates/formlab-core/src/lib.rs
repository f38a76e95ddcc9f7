//! # formlab-core
//!
//! Core types, errors, and defaults for the FormLab movement analysis pipeline.
//!
//! This crate provides the foundational data structures that the analysis,
//! job, and API crates depend on: the job lifecycle record, metric and
//! feedback types, pose frames, and the sport/movement catalog.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod movements;
pub mod pose;

// Re-export commonly used types at crate root
pub use error::{sanitize_message, Error, JobErrorKind, Result};
pub use models::*;
pub use movements::{MovementInfo, Sport, SportInfo};
pub use pose::{joint_angle, Landmark, PoseFrame};
