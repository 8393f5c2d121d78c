use thiserror::Error;

/// Capture device could not be opened. Never fatal for the session: the
/// controller degrades to an empty local media handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("capture permission denied")]
    Denied,
    #[error("no capture device available")]
    Unavailable,
    #[error("capture device failed: {0}")]
    Device(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayLinkError {
    #[error("failed to open relay link: {0}")]
    Connect(String),
    #[error("relay link closed")]
    Closed,
}

/// Failure of a single PeerLink. Only the affected link is closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("failed to create peer transport: {0}")]
    Transport(String),
    #[error("failed to attach local tracks: {0}")]
    Attach(String),
    #[error("malformed session description: {0}")]
    MalformedDescription(String),
    #[error("rejected candidate: {0}")]
    MalformedCandidate(String),
    #[error("failed to produce session description: {0}")]
    Description(String),
    #[error("peer transport failed")]
    TransportFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransmitError {
    #[error("relay link is not open, dropped {0} message")]
    LinkClosed(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("room session has ended")]
pub struct SessionClosed;
