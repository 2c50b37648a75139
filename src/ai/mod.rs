//! AI collaborator: batched summarization calls
//!
//! The [`Summarizer`] trait is the pipeline's only door to the model. Each
//! method is one network call and reports the token usage the endpoint
//! billed for it.

mod error;
mod mock;
mod openai;
mod prompt;
mod response;
mod summarizer;

pub use error::CollaboratorError;
pub use mock::MockSummarizer;
pub use openai::OpenAiSummarizer;
pub use response::ParseError;
pub use summarizer::{
    DirectoryRequest, DirectorySummary, FileInput, FinalSynthesis, RepositoryRequest, Summarizer,
    UnitRequest, UnitSummary,
};
