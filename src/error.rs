use serde::Serialize;
use thiserror::Error;

/// Everything that can abort a render pass or an upload preview.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("no data available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("no companies selected")]
    EmptySelection,

    #[error("malformed upload: {0}")]
    MalformedUpload(String),

    #[error("unknown company: {0}")]
    UnknownCompany(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// What the user gets to see. Only an empty selection is treated as an
/// expected condition; every other failure shares one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptySelection,
    Generic,
}

pub const EMPTY_SELECTION_MESSAGE: &str = "Please select at least one company.";
pub const GENERIC_ERROR_MESSAGE: &str = "Error";

impl DashboardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DashboardError::EmptySelection => ErrorKind::EmptySelection,
            _ => ErrorKind::Generic,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::EmptySelection => EMPTY_SELECTION_MESSAGE,
            ErrorKind::Generic => GENERIC_ERROR_MESSAGE,
        }
    }
}
