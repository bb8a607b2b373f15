/*!
  Assembler errors. Every variant that comes out of a source file carries
  the line it was found on.
*/

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AsmError {
  #[error("{0}")]
  Io(#[from] std::io::Error),

  #[error("Unmatched delimiter in line {line}")]
  UnmatchedDelimiter { line: usize },

  #[error("Unexpected character {found:?} in line {line}")]
  UnexpectedCharacter { found: char, line: usize },

  #[error("Unexpected token {token} in line {line}")]
  UnexpectedToken { token: String, line: usize },

  #[error("Undefined directive {directive} in line {line}")]
  UndefinedDirective { directive: String, line: usize },

  #[error("Undefined symbol {symbol} in line {line}")]
  UndefinedSymbol { symbol: String, line: usize },

  #[error("Multiple definition of label {label} in line {line}")]
  LabelMultipleDefinition { label: String, line: usize },

  #[error("Bad number {token} in line {line}")]
  BadNumber { token: String, line: usize },
}
