// Infrastructure implementations for Stepwise.

pub mod concurrency;
pub mod config;
pub mod parser;
pub mod sandbox;

use crate::domain::ast::Module;
use crate::domain::error::ParseError;
use crate::ports::SourceParser;

pub use config::AnalyzerConfig;
pub use sandbox::SandboxRunner;

/// `SourceParser` backed by the tree-sitter Python grammar.
pub struct ScriptParser;

impl SourceParser for ScriptParser {
    fn parse(&self, source: &str) -> Result<Module, ParseError> {
        parser::parse_module(source)
    }
}
