use thiserror::Error;

/// Lỗi kết nối tới relay. Luôn được log lại, không bao giờ đẩy lên UI.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid relay endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("websocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("relay refused namespace connect: {0}")]
    Refused(String),
    #[error("not connected; dropping `{event}` emit")]
    NotConnected { event: String },
    #[error("failed to encode `{event}` frame: {source}")]
    Encode {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Payload từ relay không đúng định dạng.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("`{event}` arrived without a payload")]
    MissingPayload { event: &'static str },
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("message {id} has blank text")]
    BlankText { id: i64 },
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifications are not permitted by the host")]
    PermissionDenied,
    #[error("notification host unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,
    #[error("unknown packet type `{0}`")]
    UnknownType(char),
    #[error("bad packet body: {0}")]
    Body(#[from] serde_json::Error),
    #[error("event packet without a name")]
    MissingEventName,
}
