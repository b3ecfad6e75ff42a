// Domain layer: syntax tree, value domain and the analysis engine.

pub mod ast;
pub mod complexity;
pub mod error;
pub mod evaluator;
pub mod execution;
pub mod input_feed;
pub mod report;
pub mod trace;
pub mod value;
