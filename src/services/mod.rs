pub mod completion;
pub mod llm;
pub mod scripted;

pub use completion::{CompletionRequest, CompletionResponse, CompletionService, Flow};
pub use llm::client::HttpCompletionService;
pub use scripted::ScriptedCompletionService;
