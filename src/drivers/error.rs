use thiserror::Error;

use crate::types::SessionState;

#[derive(Debug, Error)]
pub enum GsrError {
    #[error("failed to open serial port {port}: {source}")]
    Connect {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("device link I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("not connected to a device")]
    NotConnected,
    #[error("`{operation}` is not valid while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    #[error("no samples recorded; nothing to export")]
    EmptyBuffer,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
}

/// A `DATA:` frame whose field could not be parsed as a number.
#[derive(Debug, Error, PartialEq)]
#[error("invalid {field} field `{value}` in DATA frame")]
pub struct FrameError {
    pub field: &'static str,
    pub value: String,
}

#[derive(Debug, Error)]
pub enum MatError {
    #[error("failed to write MAT file: {0}")]
    Write(String),
    #[error("failed to read MAT file: {0}")]
    Read(String),
}

impl From<serde_json::Error> for GsrError {
    fn from(value: serde_json::Error) -> Self {
        GsrError::Config(value.to_string())
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for GsrError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        GsrError::Plot(format!("{value:?}"))
    }
}

impl From<image::ImageError> for GsrError {
    fn from(value: image::ImageError) -> Self {
        GsrError::Plot(value.to_string())
    }
}
