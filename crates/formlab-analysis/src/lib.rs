//! # formlab-analysis
//!
//! Turns pose sequences into scored, coached movement assessments.
//!
//! This crate provides:
//! - Per-movement analyzers behind a closed [`Movement`] enum
//! - The penalty-based [`ScoringEngine`]
//! - The [`FeedbackPipeline`] that consolidates, deduplicates and filters feedback
//!
//! ## Example
//!
//! ```ignore
//! use formlab_analysis::{Assessor, Movement};
//!
//! let movement = Movement::resolve("golf", "driver")?;
//! let assessment = Assessor::default().assess(movement, &frames);
//! println!("{} scored {}", movement, assessment.overall_score);
//! ```

pub mod analyzers;
pub mod descriptions;
pub mod feedback;
pub mod scoring;
pub mod synthetic;

pub use analyzers::{Assessment, Assessor, Movement, MovementReport};
pub use feedback::{ConsolidationOptions, FeedbackPipeline};
pub use scoring::{ScoringConfig, ScoringEngine};
