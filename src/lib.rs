pub mod config;
pub mod error;
pub mod exceptions;
pub mod init;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod policy;
pub mod records;
pub mod report;

// Re-export main types for easy access
pub use error::LoadError;
pub use exceptions::{ExceptionRule, ExceptionsFile, RuleType, SuggestedRule};
pub use pipeline::{run_pipeline, PipelineOptions};
pub use policy::{ComplianceStandards, Deviation, Dimension, Priority};
pub use records::{Dataset, HotelStandard, RatePlanRecord, TaxFlag};
pub use report::{ComplianceReport, ComplianceSummary};
