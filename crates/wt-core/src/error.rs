use thiserror::Error;

#[derive(Debug, Error)]
pub enum WtError {
    #[error("not initialized: run 'wt init'")]
    NotInitialized,

    #[error("workspace token not set: export WT_WORKSPACE_TOKEN")]
    MissingToken,

    #[error("workspace base URL not configured: set workspace.base_url in .wt/config.yaml")]
    MissingBaseUrl,

    #[error("unknown entry type '{0}': valid values: decision, implementation, review, rollback, note")]
    InvalidEntryType(String),

    #[error("malformed log line {line}: {source}")]
    MalformedLogLine {
        line: usize,
        source: serde_json::Error,
    },

    #[error("export file '{path}' has no top-level 'data' array")]
    MalformedExport { path: String },

    #[error("workspace API error ({status}): {body}")]
    Remote { status: u16, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WtError>;
