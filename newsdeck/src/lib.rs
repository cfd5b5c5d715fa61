// Library interface for the newsdeck client modules
// This allows tests and the terminal binary to import them

pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod request;
pub mod source;
pub mod state;

pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use request::{DateRange, EndpointLabel, ProxyRequest, SortOrder, ViewParams};
pub use source::{FetchError, HttpNewsSource, NewsSource};
pub use state::{FetchState, FetchStatus, Pagination};
