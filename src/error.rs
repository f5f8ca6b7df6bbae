/// Errors raised while setting up a login session.
///
/// Once a session is running nothing is reported through this type: channel failures and
/// timeouts become session states instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid activation query: {0}")]
    Query(#[from] serde_urlencoded::de::Error),
    #[error("invalid login configuration at `{path}`: {source}")]
    Config {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} is required, see `{1}`")]
    MissingCollaborator(&'static str, &'static str),
    #[error("login sessions must be started from within a tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
