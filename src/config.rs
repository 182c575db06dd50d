use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "ClaimLens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Ollama endpoint used when `OLLAMA_HOST` is unset.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Embedding model requested from Ollama for similarity scoring.
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Log filter applied when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "claimlens_lib=info,warn"
}

/// Ollama base URL, honouring `OLLAMA_HOST`.
pub fn ollama_base_url() -> String {
    std::env::var("OLLAMA_HOST")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
}

/// Optional knowledge-base override file (`CLAIMLENS_KNOWLEDGE_BASE`).
pub fn knowledge_base_path() -> Option<PathBuf> {
    std::env::var_os("CLAIMLENS_KNOWLEDGE_BASE").map(PathBuf::from)
}
