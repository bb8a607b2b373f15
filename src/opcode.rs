/*!
  Opcodes of the virtual processor.

  An opcode is a single byte. The top two bits encode how many operands the
  fetch stage pops from the data stack before dispatch (`0b00` = none,
  `0b01` = one, `0b10` = two); the low six bits index the operation. The
  fetch loop can therefore pop operands uniformly without per-opcode
  decoding, and new opcodes can be added without touching the decoder.

  This enum is the single source of truth: the assembler's mnemonic table
  comes from the `strum` derives and the interpreter's decoder from the
  `num_enum` derives, so the two sides cannot drift apart. Changing any
  discriminant is a binary-compatibility break.
*/

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

/// No operands popped during fetch.
pub const POP0: u8 = 0x00;
/// One operand popped during fetch.
pub const POP1: u8 = 0x40;
/// Two operands popped during fetch.
pub const POP2: u8 = 0x80;

#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq, Debug,           Hash,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[repr(u8)]
pub enum Op {
  Hlt    = POP0,
  Nop    = POP0 | 1,
  Emit   = POP1 | 2,
  Period = POP1 | 3,

  /* Stack manipulation */
  Push   = POP0 | 4,  /* Push an immediate word onto the stack */
  PushB  = POP0 | 5,  /* Push an immediate byte onto the stack */
  Dup    = POP1 | 6,  /* Duplicate the top stack item */
  Drop   = POP1 | 7,  /* Discard the top stack item */
  Swap   = POP2 | 8,  /* Reverse the top two stack items */
  Over   = POP2 | 9,  /* Copy the second item to the top */
  Pick   = POP1 | 10, /* Copy the n-th item to the top */
  Roll   = POP1 | 11, /* Rotate the n-th item to the top */
  Depth  = POP0 | 12, /* Count the items on the stack */

  /* Return stack manipulation */
  ToR    = POP1 | 13, /* Move the top item to the return stack */
  RFrom  = POP0 | 14, /* Retrieve an item from the return stack */
  RFetch = POP0 | 15, /* Copy the top of the return stack */

  /* Arithmetic */
  Add    = POP2 | 16,
  Sub    = POP2 | 17,
  Mul    = POP2 | 18,
  Div    = POP2 | 19,
  Divmod = POP2 | 20, /* Floored quotient and remainder */
  Max    = POP2 | 21,
  Min    = POP2 | 22,
  Abs    = POP1 | 23,
  Mod    = POP2 | 24,
  Lshift = POP2 | 25,
  Rshift = POP2 | 26, /* Arithmetic shift on the signed word */

  /* Logical */
  And    = POP2 | 27,
  Or     = POP2 | 28,
  Xor    = POP2 | 29,
  Not    = POP1 | 30, /* Reverse the truth value */

  /* Comparison */
  Eq     = POP2 | 31,
  Ne     = POP2 | 32,
  Ge     = POP2 | 33,
  Gt     = POP2 | 34,
  Le     = POP2 | 35,
  Lt     = POP2 | 36,

  /* Control and subroutines */
  Jnz    = POP2 | 37,
  Jz     = POP2 | 38,
  #[strum(to_string = "JMP", serialize = "POPPC")]
  Jmp    = POP1 | 39,
  Call   = POP1 | 40,
  Ret    = POP0 | 41,

  /* Memory */
  Store  = POP2 | 42,
  StoreB = POP2 | 43,
  Fetch  = POP1 | 44,
  FetchB = POP1 | 45,

  /* Registers */
  Pushrsp = POP0 | 46, /* Push the return stack pointer */
  Poprsp  = POP1 | 47, /* Pop into the return stack pointer */
  Pushrbp = POP0 | 48, /* Push the return stack origin */
  Poprbp  = POP1 | 49, /* Pop into the return stack origin */
  Pushpc  = POP0 | 50, /* Push the program counter */
}

impl Op {
  /// The raw opcode byte.
  pub fn code(self) -> u8 {
    self.into()
  }

  /// How many operands the fetch stage pops for this opcode.
  pub fn arity(self) -> u8 {
    self.code() >> 6
  }
}

#[cfg(test)]
mod tests {
  use std::convert::TryFrom;
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn mnemonic_roundtrip() {
    for op in Op::iter() {
      let mnemonic = op.to_string();
      assert_eq!(Op::from_str(&mnemonic).unwrap(), op);
      assert_eq!(Op::from_str(&mnemonic.to_lowercase()).unwrap(), op);
    }
  }

  #[test]
  fn mnemonics() {
    assert_eq!(Op::from_str("push_b").unwrap(), Op::PushB);
    assert_eq!(Op::from_str("TO_R").unwrap(), Op::ToR);
    assert_eq!(Op::from_str("r_from").unwrap(), Op::RFrom);
    assert_eq!(Op::from_str("R_FETCH").unwrap(), Op::RFetch);
    assert_eq!(Op::from_str("pushrsp").unwrap(), Op::Pushrsp);
    assert_eq!(Op::Jmp.to_string(), "JMP");
    assert!(Op::from_str("bogus").is_err());
  }

  #[test]
  fn poppc_is_a_jmp_alias() {
    assert_eq!(Op::from_str("POPPC").unwrap(), Op::Jmp);
    assert_eq!(Op::from_str("poppc").unwrap(), Op::Jmp);
  }

  #[test]
  fn arity_matches_encoding() {
    for op in Op::iter() {
      assert_eq!(op.arity(), op.code() >> 6);
      assert!(op.arity() <= 2);
    }
    assert_eq!(Op::Hlt.arity(), 0);
    assert_eq!(Op::Dup.arity(), 1);
    assert_eq!(Op::Swap.arity(), 2);
    assert_eq!(Op::Jmp.arity(), 1);
    assert_eq!(Op::Jnz.arity(), 2);
    assert_eq!(Op::Store.arity(), 2);
  }

  #[test]
  fn decode_rejects_unknown_bytes() {
    assert!(Op::try_from(0xFFu8).is_err());
    assert!(Op::try_from(POP2 | 63).is_err());
    assert_eq!(Op::try_from(Op::Divmod.code()).unwrap(), Op::Divmod);
  }
}
