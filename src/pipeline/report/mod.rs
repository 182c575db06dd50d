pub mod annotations;
pub mod exam_request;

pub use annotations::*;
pub use exam_request::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
