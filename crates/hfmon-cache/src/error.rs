use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize cache entry {fingerprint}: {source}")]
    Serialize {
        fingerprint: String,
        #[source]
        source: serde_json::Error,
    },
}
