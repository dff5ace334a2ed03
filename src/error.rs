use thiserror::Error;

pub type Result<T> = std::result::Result<T, HistmineError>;

#[derive(Error, Debug)]
pub enum HistmineError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),
    #[error("Harvest error: {0}")]
    Harvest(#[from] HarvestError),
    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),
    #[error("Repository error: {0}")]
    Repository(String),
    #[error("Export error: {0}")]
    Export(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
}

impl From<gix::discover::Error> for HistmineError {
    fn from(err: gix::discover::Error) -> Self {
        HistmineError::GitDiscover(Box::new(err))
    }
}

/// Failures of a single git subprocess invocation.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("stdout of `{0}` was not captured")]
    NoStdout(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort the whole history harvest.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("cannot convert {field} '{value}' into an integer on line {line}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        line: usize,
    },
    #[error("stat line {line} appeared before any commit header: {content}")]
    OrphanStatLine { line: usize, content: String },
    #[error("malformed stat line {line}: {content}")]
    MalformedStatLine { line: usize, content: String },
    #[error(transparent)]
    Git(#[from] GitError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("harvest worker disconnected before finishing")]
    WorkerLost,
    #[error("time limit reached before the page was read")]
    DeadlineExpired,
}

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("invalid pattern for {language}: {source}")]
    Pattern {
        language: String,
        #[source]
        source: regex::Error,
    },
}
