// Analyzer page: form submission handling and result rendering.
// The same controller drives the server-rendered page and the CLI client;
// only the transport and notifier differ.

pub mod controller;
pub mod dom;
pub mod form;
pub mod notify;
pub mod page;
pub mod renderer;
pub mod transport;

use thiserror::Error;

pub const GENERIC_ERROR_MESSAGE: &str = "Unable to analyze job role.";
pub const DECODE_ERROR_MESSAGE: &str = "Unable to read the analysis response.";

/// Everything that can go wrong between submit and render.
/// `Display` is the exact text shown to the user.
#[derive(Debug, Clone, Error)]
pub enum SubmitError {
    /// The form could not be serialized (e.g. non-numeric years of experience).
    #[error("{0}")]
    InvalidInput(String),

    /// Non-2xx response; `detail` is the server's message or the generic fallback.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    /// The request never completed.
    #[error("{0}")]
    Network(String),

    /// A 2xx response whose body was not a valid analysis result.
    #[error("{}", DECODE_ERROR_MESSAGE)]
    Decode(String),
}
