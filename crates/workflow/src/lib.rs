pub mod driver;
pub mod holder;
pub mod search;

#[cfg(test)]
pub(crate) mod mock;

pub use driver::{StepResult, Workflow, WorkflowOptions};
pub use holder::SessionHolder;
pub use search::{classify_results, CaseStatus, SearchQuery};
