pub mod ingestion; // Document ingestion: format routing, OCR fallback, metadata
pub mod analysis; // Evidence analysis against claimed conditions
pub mod report; // Annotation bundle + exam request
pub mod processor; // End-to-end claim orchestrator
pub mod queue; // Background claim queue
