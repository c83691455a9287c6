/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listening socket failed.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The peer connected but the WebSocket upgrade did not complete.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Sending a frame failed.
    #[error("send failed: {0}")]
    Send(String),

    /// Receiving a frame failed.
    #[error("receive failed: {0}")]
    Receive(String),
}
