pub mod compare;
pub mod detail;
pub mod persist;
pub mod record;
pub mod runner;
pub mod scenario;
pub mod store;
pub mod summary;

pub use compare::{compare_stores, write_report, ComparisonStatus, ScenarioComparison, Tolerance};
pub use detail::{detail_scenario, DetailedComparison};
pub use persist::{load, load_document, persist, DEFAULT_RESULTS_PATH};
pub use record::{FailureRecord, ResultRecord, SuccessRecord};
pub use runner::ScenarioRunner;
pub use scenario::{load_suite, ScenarioDefinition, ScenarioSuite};
pub use store::ResultStore;
pub use summary::{classify, summarize, summarize_document, Classification, SummaryCounts};
