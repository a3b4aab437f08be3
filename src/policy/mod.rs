pub mod config;
pub mod matcher;
pub mod checker;

// Re-export main types
pub use config::ComplianceStandards;
pub use matcher::{Dimension, Priority};
pub use checker::{Deviation, Evaluation, SkippedRecord};
