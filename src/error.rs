use tokio_tungstenite::tungstenite;

/// Everything that can go wrong between the socket and the network weights.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not enough transitions to sample: requested {requested}, stored {stored}")]
    InsufficientData { requested: usize, stored: usize },

    #[error("state has {actual} features, network expects {expected}")]
    StateSize { expected: usize, actual: usize },

    #[error("target has {actual} values, network expects {expected}")]
    TargetSize { expected: usize, actual: usize },

    #[error("action index {0} has no wire encoding")]
    UnknownAction(usize),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Peer went away; the session should end quietly.
    pub fn is_connection_closed(&self) -> bool {
        matches!(
            self,
            Error::WebSocket(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed)
        )
    }
}
