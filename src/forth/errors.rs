/*!
  Front-end errors.
*/

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForthError {
  #[error("{0}")]
  Io(#[from] std::io::Error),

  /// An unknown word in the second pass.
  #[error("{0} ?")]
  UndefinedWord(String),

  #[error("Unbalanced control structure '{0}'")]
  UnbalancedControl(String),

  #[error("Missing name after ':'")]
  MissingColonName,

  #[error("Missing name after 'constant'")]
  MissingConstantName,

  /// Dictionary expansions recursed past the cycle bound.
  #[error("Expansion of '{0}' is too deep")]
  ExpansionTooDeep(String),
}
