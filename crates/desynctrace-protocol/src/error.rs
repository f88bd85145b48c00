use thiserror::Error;

/// Error taxonomy shared by the detection engine. Transport-level causes
/// (DNS/TCP/TLS failures, read/write deadlines) are classified into these at
/// the transport boundary; everything above only ever sees this enum.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// DNS/TCP/TLS setup failure. Abort that payload, continue the vector.
    #[error("transport setup failed: {0}")]
    TransportFatal(String),

    /// Read or write deadline exceeded. Not a user-facing error: a material
    /// signal for the blind detector.
    #[error("request timed out after {0:?}")]
    TransportTimeout(std::time::Duration),

    /// GOAWAY, RST_STREAM, or a malformed response. Recorded as evidence,
    /// never aborts the scan.
    #[error("protocol reset: {0}")]
    ProtocolReset(String),

    /// The baseline GET itself failed. Aborts the poisoning detector for this
    /// vector only; the blind result (if any) is kept.
    #[error("baseline request failed: {0}")]
    BaselineFailure(String),
}
