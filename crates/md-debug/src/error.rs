use thiserror::Error;

pub type Result<T> = std::result::Result<T, TraceError>;

/// Failure surfaced by a tracer callback or dump.
///
/// Decoding and rendering never fail; the only fallible parts are the output
/// sink, JSON export, and a step tuple whose opcode id is outside the
/// architecture's mnemonic table.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace output failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("trace export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown {arch} opcode id {id}")]
    UnknownOpcode { arch: &'static str, id: u16 },
}
