pub mod models;
pub mod storage;
pub mod checker;
pub mod suggest;

// Re-export commonly used items
pub use models::{ExceptionRule, ExceptionsFile, RuleStatus, RuleType, Specificity};
pub use storage::{load_exceptions, EXCEPTION_COLUMNS};
pub use checker::{AcceptedDeviation, AppliedRule, MatchOutcome};
pub use suggest::{suggest_rules, SuggestedRule, DEFAULT_MIN_OCCURRENCES};
