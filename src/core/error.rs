use thiserror::Error;

/// Errors that can occur while extracting records from a fiscal document.
///
/// None of these escape [`parse_fiscal_xml`](crate::parse::parse_fiscal_xml):
/// the dispatcher logs them and returns `None`. They are exposed for callers
/// that use the `try_` entry point and want the reason.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FiscalError {
    /// The cleaned text is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// The document is an event envelope (CC-e, manifestação, cancellation
    /// event), not an authorized document.
    #[error("event document skipped: {0}")]
    EventDocument(String),

    /// No NF-e or CT-e root was found and the salvage pass failed too.
    #[error("unrecognized format: {0}")]
    UnrecognizedFormat(String),

    /// Report generation failed.
    #[error("export error: {0}")]
    Export(String),
}

/// A per-file failure collected during batch processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// Name of the file as given by the caller.
    pub file_name: String,
    /// Human-readable reason.
    pub message: String,
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file_name, self.message)
    }
}

impl FileFailure {
    pub fn new(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            message: message.into(),
        }
    }
}
