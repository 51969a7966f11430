mod nodes;
pub mod parser;

pub use crate::ast::parser::ParseError;
pub use nodes::*;

use crate::lexer::Lexer;

pub fn parse(lexer: &Lexer) -> Result<Chunk, ParseError> {
    use crate::ast::parser::Parser;
    Parser::parse(lexer)
}
