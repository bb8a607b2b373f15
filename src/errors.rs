/*!
  Runtime error taxonomy. `Halt` doubles as the loop-exit signal for a clean
  `HLT` or an exhausted instruction budget; everything else is fatal.
*/

use thiserror::Error;

use crate::Addr;

#[derive(Error, Debug)]
pub enum VmError {
  /// Normal termination. Not a failure.
  #[error("halt")]
  Halt,

  #[error("bad executable format")]
  BadExecFormat,

  #[error("illegal instruction {op:#04x} at {pc:#010x}")]
  IllegalInstruction { op: u8, pc: Addr },

  #[error("stack underflow")]
  StackUnderflow,

  #[error("stack overflow")]
  StackOverflow,

  #[error("division by zero")]
  DivisionByZero,

  #[error("{0}")]
  Io(#[from] std::io::Error),
}
