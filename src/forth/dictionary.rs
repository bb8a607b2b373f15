/*!
  The built-in word dictionary.

  A word maps either to a raw mnemonic sequence emitted verbatim into the
  assembly stream (`Left`, the compiled form of `;code … ;`) or to a source
  expansion that is itself compiled, recursively (`Right`). Expansions may
  reference other dictionary words and control structures; the compiler
  bounds the recursion depth to catch accidental cycles.
*/

use std::collections::HashMap;

use either::Either::{self, Left, Right};

/// `Left`: mnemonics for the assembler. `Right`: source to recompile.
pub type Entry = Either<&'static str, &'static str>;

lazy_static! {
  pub static ref DICTIONARY: HashMap<&'static str, Entry> = {
    let mut words: HashMap<&'static str, Entry> = HashMap::new();

    /* Stack manipulation */
    words.insert("DUP", Left("dup"));
    words.insert("DROP", Left("drop"));
    words.insert("SWAP", Left("swap"));
    words.insert("OVER", Left("over"));
    words.insert("ROT", Left("push 2 roll"));
    words.insert("DEPTH", Left("depth"));
    words.insert("?DUP", Right("DUP IF DUP THEN"));
    words.insert("NIP", Right("SWAP DROP"));
    words.insert("TUCK", Right("SWAP OVER"));
    words.insert("2DUP", Right("OVER OVER"));
    words.insert("2DROP", Right("DROP DROP"));
    words.insert("2OVER", Left("push 3 pick push 3 pick"));
    words.insert("2SWAP", Left("push 3 roll push 3 roll"));

    /* Arithmetic */
    words.insert("+", Left("add"));
    words.insert("-", Left("sub"));
    words.insert("*", Left("mul"));
    words.insert("/", Left("div"));
    words.insert("/MOD", Left("divmod"));
    words.insert("MOD", Left("mod"));
    words.insert("1+", Left("push 1 add"));
    words.insert("1-", Left("push 1 sub"));
    words.insert("2+", Left("push 2 add"));
    words.insert("2-", Left("push 2 sub"));
    words.insert("2*", Left("push 1 lshift"));
    words.insert("2/", Left("push 1 rshift"));
    words.insert("MAX", Left("max"));
    words.insert("MIN", Left("min"));
    words.insert("ABS", Left("abs"));
    words.insert("NEGATE", Left("push 0 swap sub"));
    words.insert("LSHIFT", Left("lshift"));
    words.insert("RSHIFT", Left("rshift"));

    /* Logical */
    words.insert("AND", Left("and"));
    words.insert("OR", Left("or"));
    words.insert("XOR", Left("xor"));
    words.insert("NOT", Left("not"));
    words.insert("INVERT", Left("push -1 xor"));
    words.insert("TRUE", Left("push -1"));
    words.insert("FALSE", Left("push 0"));

    /* Comparison */
    words.insert("=", Left("eq"));
    words.insert("<>", Left("ne"));
    words.insert(">", Left("gt"));
    words.insert(">=", Left("ge"));
    words.insert("<", Left("lt"));
    words.insert("<=", Left("le"));
    words.insert("0=", Left("push 0 eq"));
    words.insert("0<", Left("push 0 lt"));
    words.insert("0>", Left("push 0 gt"));
    words.insert("0<>", Left("push 0 ne"));

    /* Return stack */
    words.insert(">R", Left("to_r"));
    words.insert("R>", Left("r_from"));
    words.insert("R@", Left("r_fetch"));
    words.insert("RP@", Left("pushrsp"));
    words.insert("RP!", Left("poprsp"));

    /* Memory */
    words.insert("!", Left("store"));
    words.insert("@", Left("fetch"));
    words.insert("C!", Left("store_b"));
    words.insert("C@", Left("fetch_b"));
    words.insert("+!", Right("DUP @ ROT + SWAP !"));
    words.insert("2!", Right("SWAP OVER ! CELL+ !"));
    words.insert("2@", Right("DUP CELL+ @ SWAP @"));
    words.insert("CELL+", Left("push 4 add"));
    words.insert("CELLS", Left("push 4 mul"));

    /* I/O and misc */
    words.insert("EMIT", Left("emit"));
    words.insert(".", Left("period"));
    words.insert("CR", Left("push 10 emit"));
    words.insert("SPACE", Left("push 32 emit"));
    words.insert("BL", Right("32"));
    words.insert("HLT", Left("hlt"));
    words.insert("NOP", Left("nop"));

    words
  };
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn primitives_are_present() {
    assert!(matches!(DICTIONARY.get("DUP"), Some(Left("dup"))));
    assert!(matches!(DICTIONARY.get("+"), Some(Left("add"))));
    assert!(matches!(DICTIONARY.get("/MOD"), Some(Left("divmod"))));
  }

  #[test]
  fn expansions_reference_known_words() {
    for entry in DICTIONARY.values() {
      if let Right(expansion) = entry {
        for word in expansion.split_whitespace() {
          let known = DICTIONARY.contains_key(word)
            || matches!(word, "IF" | "ELSE" | "THEN")
            || word.parse::<i32>().is_ok();
          assert!(known, "expansion references unknown word {}", word);
        }
      }
    }
  }
}
