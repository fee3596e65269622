// src/gcode/mod.rs
pub mod parser;
pub mod rewriter;

use thiserror::Error;

pub use parser::{classify, Instruction, Move};
pub use rewriter::{limit_instruction, reduce_velocity, AccelerationOverride, Reduction, RewriteStats, StreamRewriter};

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("input file not found: {path}")]
    InputNotFound { path: String },
    #[error("output path is the input file: {path}")]
    OutputIsInput { path: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed instruction at line {line}: {reason}")]
    LineMalformed { line: usize, reason: String },
    #[error("arithmetic fault at line {line}: {reason}")]
    ArithmeticFault { line: usize, reason: String },
}
