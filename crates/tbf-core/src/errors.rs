/// Core error type for the relay.
///
/// Adapter crates map their platform-specific errors into this type so the
/// pipeline can handle failures consistently (logged-and-abandoned per item
/// vs fatal at startup).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(String),

    /// The destination API answered `ok: false`; carries its human-readable
    /// description. No structured error codes are exposed beyond this.
    #[error("api error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, Error>;
