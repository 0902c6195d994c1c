use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchicadError {
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("ArchiCAD JSON API not reachable at {candidates:?}. Start ArchiCAD, open a project and leave it idle.")]
    ConnectorUnavailable { candidates: Vec<String> },

    #[error("connection failed for `{endpoint}`: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("transport send failed: {reason}")]
    TransportSend { reason: String },

    #[error("transport receive failed: {reason}")]
    TransportReceive { reason: String },

    #[error("transport task is unavailable")]
    TransportClosed,

    #[error("request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("API error `{code}` for `{command}`: {message}")]
    ApiStatus {
        command: String,
        code: i64,
        message: String,
    },

    #[error("API response for `{command}` missing field `{field}`")]
    MissingPayload { command: String, field: String },

    #[error("JSON decode failed: {0}")]
    JsonDecode(String),

    #[error("unsupported property value kind `{kind}`; extend the wire kind table")]
    UnsupportedWireKind { kind: String },

    #[error("no template recorded for column `{column}`; its type cannot be reconstructed")]
    MissingTemplate { column: String },

    #[error("value does not fit `{kind}`: {reason}")]
    ValueShape { kind: &'static str, reason: String },

    #[error("invalid property column name `{name}`: {reason}")]
    InvalidColumnName { name: String, reason: String },

    #[error("reading `{column}` of element `{element}` failed with `{code}`: {message}")]
    PropertyRead {
        element: String,
        column: String,
        code: i64,
        message: String,
    },

    #[error("property id lookup for `{column}` failed with `{code}`: {message}")]
    PropertyIdLookup {
        column: String,
        code: i64,
        message: String,
    },

    #[error("element `{element}` is not a row of this table")]
    UnknownElement { element: String },

    #[error("column `{column}` is not part of this table")]
    UnknownColumn { column: String },

    #[error("element `{element}` appears more than once")]
    DuplicateElement { element: String },

    #[error("{what}: expected {expected} entries, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("launching `{command}` failed: {reason}")]
    Launch { command: String, reason: String },

    #[error("runtime task join failed: {0}")]
    RuntimeJoin(String),
}
