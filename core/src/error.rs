use thiserror::Error;

use crate::code8b10b::Disparity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unrecognized 10-bit symbol {word:#05x}")]
    UnrecognizedSymbol { word: u16 },

    #[error("Symbol {word:#05x} violates running disparity (expected {expected})")]
    DisparityMismatch { word: u16, expected: Disparity },

    #[error("Invalid frame size: expected {expected}, got {actual}")]
    InvalidFrameSize { expected: usize, actual: usize },

    #[error("Frame is not terminated by an end-of-frame symbol")]
    MissingEndOfFrame,

    #[error("Unexpected end-of-frame symbol at position {position}")]
    UnexpectedEndOfFrame { position: usize },

    #[error("Reed-Solomon parity mismatch in codeword {codeword}")]
    ParityMismatch { codeword: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
