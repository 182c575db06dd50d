pub mod types;
pub mod embedder;
pub mod entities;
pub mod knowledge;
pub mod relevance;
pub mod evidence;
pub mod aggregate;
pub mod timeline;
pub mod scoring;
pub mod gaps;
pub mod presumptive;
pub mod discovery;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_support;

pub use types::*;
pub use embedder::*;
pub use entities::*;
pub use knowledge::*;
pub use relevance::*;
pub use evidence::*;
pub use aggregate::*;
pub use timeline::*;
pub use scoring::*;
pub use gaps::*;
pub use presumptive::*;
pub use discovery::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Similarity service failed: {0}")]
    Similarity(String),

    #[error("Entity extraction failed: {0}")]
    EntityExtraction(String),

    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    #[error("No documents supplied for claim {0}")]
    NoDocuments(String),
}
