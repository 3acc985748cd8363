//! Client error taxonomy.
//!
//! Only transport failures at connect time are returned as `Err` to the caller.
//! Everything after the connection opens is surfaced as a view state instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The address was refused or unreachable when opening the connection.
    #[error("could not connect to {address}: {source}")]
    Transport {
        address: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    /// An open connection dropped. Terminal for this session.
    #[error("connection lost")]
    ConnectionLost,

    /// The server rejected a request.
    #[error("server rejected request: {0}")]
    Operation(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
