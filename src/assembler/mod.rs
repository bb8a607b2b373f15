/*!
  A two-pass symbolic assembler.

  Pass 1 walks the token stream collecting every label into the symbol
  table, emitting a placeholder word wherever an identifier is not yet
  known; a label defined twice is an error here. Pass 2 re-lexes from the
  start with the pass-1 table and emits real bytes; an identifier that is
  still unknown is now an error. Both passes drive the same emission code so
  the two address counters cannot drift.

  Two independent segments (text and data) each own a base address, a byte
  buffer, and an address counter; `.text` and `.data` switch the current
  one. A `PUSH` is preceded by as many `NOP`s as it takes for its immediate
  to start on a word boundary, which lets the machine read the immediate as
  an aligned word.
*/

pub mod errors;
pub mod lexer;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use prettytable::{format as table_format, Table};
use string_cache::DefaultAtom;

pub use errors::AsmError;
use lexer::{parse_number, Lexer, TokenKind};

use crate::image::Image;
use crate::opcode::Op;
use crate::{Addr, Word, DATA_SEGMENT, TEXT_SEGMENT, WORD_SIZE};

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
enum Pass {
  First,
  Second,
}

/// The data directive currently in effect.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
enum Directive {
  None,
  Word,
  Byte,
  Asciz,
  Ascii,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
enum SegmentKind {
  Text,
  Data,
}

struct Segment {
  addr: Addr,
  buf: Vec<u8>,
}

impl Segment {
  fn new(start: Addr) -> Segment {
    Segment {
      addr: start,
      buf: Vec::new(),
    }
  }
}

pub type LabelTable = HashMap<DefaultAtom, Addr>;

/// The state of one assembly pass.
struct Assembly {
  text: Segment,
  data: Segment,
  current: SegmentKind,
  labels: LabelTable,
  pass: Pass,
  verbose: bool,
}

impl Assembly {
  fn new(pass: Pass, labels: LabelTable, verbose: bool) -> Assembly {
    Assembly {
      text: Segment::new(TEXT_SEGMENT),
      data: Segment::new(DATA_SEGMENT),
      current: SegmentKind::Text,
      labels,
      pass,
      verbose,
    }
  }

  fn segment(&self) -> &Segment {
    match self.current {
      SegmentKind::Text => &self.text,
      SegmentKind::Data => &self.data,
    }
  }

  fn segment_mut(&mut self) -> &mut Segment {
    match self.current {
      SegmentKind::Text => &mut self.text,
      SegmentKind::Data => &mut self.data,
    }
  }

  fn add_word(&mut self, value: Word) {
    if self.verbose {
      println!("{:08x} {:x}", self.segment().addr, value as u32);
    }
    let segment = self.segment_mut();
    segment.buf.extend_from_slice(&value.to_le_bytes());
    segment.addr += WORD_SIZE;
  }

  fn add_bytes(&mut self, bytes: &[u8]) {
    if self.verbose {
      println!("{:08x} {:02x?}", self.segment().addr, bytes);
    }
    let segment = self.segment_mut();
    segment.buf.extend_from_slice(bytes);
    segment.addr += bytes.len() as Addr;
  }

  fn add_code(&mut self, op: Op) {
    if self.verbose {
      println!("{:08x} {}", self.segment().addr, op);
    }
    let segment = self.segment_mut();
    segment.buf.push(op.code());
    segment.addr += 1;
  }

  /// One pass over the whole source.
  fn run(&mut self, text: &str) -> Result<(), AsmError> {
    let mut lexer = Lexer::new(text);
    let mut directive = Directive::None;
    while let Some(token) = lexer.next_token()? {
      match token.kind {
        TokenKind::Instruction(op) => {
          if op == Op::Push {
            // Pad so the immediate after the opcode byte is word-aligned.
            while self.segment().addr % WORD_SIZE != WORD_SIZE - 1 {
              self.add_code(Op::Nop);
            }
          }
          self.add_code(op);
          directive = Directive::None;
        }

        TokenKind::Directive => {
          directive = match token.symbol.as_str() {
            ".TEXT" => {
              self.current = SegmentKind::Text;
              Directive::None
            }
            ".DATA" => {
              self.current = SegmentKind::Data;
              Directive::None
            }
            ".WORD" => Directive::Word,
            ".BYTE" => Directive::Byte,
            ".ASCIZ" => Directive::Asciz,
            ".ASCII" => Directive::Ascii,
            _ => {
              return Err(AsmError::UndefinedDirective {
                directive: token.symbol,
                line: token.line,
              })
            }
          };
        }

        TokenKind::Identifier => {
          let resolved = self
            .labels
            .get(&DefaultAtom::from(token.symbol.as_str()))
            .copied();
          match resolved {
            Some(addr) => self.add_word(addr as Word),
            // Unknown identifiers are tolerated in the first pass; the
            // placeholder has the width of the final address word.
            None if self.pass == Pass::First => self.add_word(-1),
            None => {
              return Err(AsmError::UndefinedSymbol {
                symbol: token.symbol,
                line: token.line,
              })
            }
          }
          directive = Directive::None;
        }

        TokenKind::Label => {
          let atom = DefaultAtom::from(token.symbol.as_str());
          if self.pass == Pass::First && self.labels.contains_key(&atom) {
            return Err(AsmError::LabelMultipleDefinition {
              label: token.symbol,
              line: token.line,
            });
          }
          let addr = self.segment().addr;
          self.labels.insert(atom, addr);
          directive = Directive::None;
        }

        TokenKind::Number => {
          let value = parse_number(&token.symbol).ok_or(AsmError::BadNumber {
            token: token.symbol.clone(),
            line: token.line,
          })?;
          match directive {
            Directive::Byte => self.add_bytes(&[value as u8]),
            Directive::None | Directive::Word => self.add_word(value),
            _ => {
              return Err(AsmError::UnexpectedToken {
                token: token.symbol,
                line: token.line,
              })
            }
          }
        }

        TokenKind::Str => match directive {
          Directive::Asciz => {
            let mut bytes = token.symbol.clone().into_bytes();
            bytes.push(0);
            self.add_bytes(&bytes);
          }
          Directive::Ascii => self.add_bytes(token.symbol.as_bytes()),
          _ => {
            return Err(AsmError::UnexpectedToken {
              token: token.symbol,
              line: token.line,
            })
          }
        },
      }
    }
    Ok(())
  }

  fn print_labels(&self) {
    let mut table = Table::new();
    table.set_format(*table_format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row![b->"Label", br->"Address"]);
    let mut labels: Vec<(String, Addr)> = self
      .labels
      .iter()
      .map(|(name, addr)| (name.to_string(), *addr))
      .collect();
    labels.sort();
    for (name, addr) in labels {
      table.add_row(row![name, r->format!("{:08x}", addr)]);
    }
    table.printstd();
  }
}

/// Assembles source text into a loadable image.
pub fn assemble(text: &str, verbose: bool) -> Result<Image, AsmError> {
  let mut first = Assembly::new(Pass::First, LabelTable::new(), false);
  first.run(text)?;
  // The second pass starts from a copy of the collected table; pass-1
  // addresses are never rewritten.
  let mut second = Assembly::new(Pass::Second, first.labels.clone(), verbose);
  second.run(text)?;
  if verbose {
    second.print_labels();
  }
  Ok(Image {
    text_base: TEXT_SEGMENT,
    data_base: DATA_SEGMENT,
    text: second.text.buf,
    data: second.data.buf,
  })
}

/// Assembles `input` and writes the image next to it.
pub fn assemble_file(input: &Path, output: &Path, verbose: bool) -> Result<(), AsmError> {
  let text = fs::read_to_string(input)?;
  let image = assemble(&text, verbose)?;
  fs::write(output, image.to_bytes())?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::image::HEADER_SIZE;

  #[test]
  fn single_instruction() {
    let image = assemble("hlt", false).unwrap();
    assert_eq!(image.text, vec![Op::Hlt.code()]);
    assert!(image.data.is_empty());
  }

  #[test]
  fn push_gets_nop_padding() {
    // The text base is word-aligned, so three NOPs put the PUSH opcode in
    // the last byte of the word and the immediate on the next boundary.
    let image = assemble("push 10 hlt", false).unwrap();
    assert_eq!(
      image.text,
      vec![
        Op::Nop.code(),
        Op::Nop.code(),
        Op::Nop.code(),
        Op::Push.code(),
        10,
        0,
        0,
        0,
        Op::Hlt.code(),
      ]
    );
  }

  #[test]
  fn push_after_push_is_already_aligned() {
    let image = assemble("push 1 push 2 hlt", false).unwrap();
    // 3 NOPs + PUSH + word, then PUSH lands on addr % 4 == 0 again: 3 more.
    assert_eq!(image.text.len(), 3 + 1 + 4 + 3 + 1 + 4 + 1);
  }

  #[test]
  fn header_sizes_match_the_payload() {
    let image = assemble(
      "push 1 hlt
       .data greeting: .asciz \"hi\"",
      false,
    )
    .unwrap();
    let bytes = image.to_bytes();
    let header = image.header();
    assert_eq!(
      bytes.len(),
      HEADER_SIZE + header.text_size as usize + header.data_size as usize
    );
    assert_eq!(image.data, vec![b'h', b'i', 0]);
  }

  #[test]
  fn labels_resolve_across_segments() {
    let image = assemble(
      ".data
       value: .word 7
       .text
       push value fetch hlt",
      false,
    )
    .unwrap();
    // The PUSH immediate is the data segment base.
    let imm = Word::from_le_bytes(image.text[4..8].try_into().unwrap());
    assert_eq!(imm as Addr, DATA_SEGMENT);
    assert_eq!(image.data, vec![7, 0, 0, 0]);
  }

  #[test]
  fn forward_references_resolve() {
    let image = assemble("push exit jmp exit: hlt", false).unwrap();
    let imm = Word::from_le_bytes(image.text[4..8].try_into().unwrap()) as Addr;
    // Three NOPs, the PUSH and its word, then the jmp byte: exit is at 9.
    assert_eq!(imm, TEXT_SEGMENT + 9);
  }

  #[test]
  fn word_directive_emits_identifiers_as_addresses() {
    let image = assemble(
      ".data
       first: .word 1
       table: .word first first
       .text hlt",
      false,
    )
    .unwrap();
    let first = Word::from_le_bytes(image.data[4..8].try_into().unwrap()) as Addr;
    assert_eq!(first, DATA_SEGMENT);
  }

  #[test]
  fn byte_directive_truncates() {
    let image = assemble(".data bytes: .byte 1 2 0x1ff .text hlt", false).unwrap();
    assert_eq!(image.data, vec![1, 2, 0xFF]);
  }

  #[test]
  fn ascii_has_no_terminator() {
    let image = assemble(".data s: .ascii \"ab\" .text hlt", false).unwrap();
    assert_eq!(image.data, vec![b'a', b'b']);
  }

  #[test]
  fn duplicate_label_is_an_error() {
    assert!(matches!(
      assemble("x: nop x: nop", false),
      Err(AsmError::LabelMultipleDefinition { .. })
    ));
  }

  #[test]
  fn adjacent_labels_share_an_address() {
    let image = assemble("a: b: hlt push a push b hlt", false);
    assert!(image.is_ok());
  }

  #[test]
  fn undefined_symbol_is_an_error_in_pass_two() {
    assert!(matches!(
      assemble("push nowhere jmp", false),
      Err(AsmError::UndefinedSymbol { .. })
    ));
  }

  #[test]
  fn undefined_directive_is_an_error() {
    assert!(matches!(
      assemble(".bogus 1", false),
      Err(AsmError::UndefinedDirective { .. })
    ));
  }

  #[test]
  fn string_outside_a_directive_is_unexpected() {
    assert!(matches!(
      assemble("\"floating\"", false),
      Err(AsmError::UnexpectedToken { .. })
    ));
  }

  #[test]
  fn passes_produce_identical_label_tables() {
    let source = "start: push later jmp
                  middle: nop
                  later: hlt
                  .data buffer: .word 0";
    let mut first = Assembly::new(Pass::First, LabelTable::new(), false);
    first.run(source).unwrap();
    let mut second = Assembly::new(Pass::Second, first.labels.clone(), false);
    second.run(source).unwrap();
    assert_eq!(first.labels, second.labels);
  }

  #[test]
  fn case_is_insignificant() {
    let a = assemble("loop: PUSH loop JMP", false).unwrap();
    let b = assemble("LOOP: push LOOP jmp", false).unwrap();
    assert_eq!(a.text, b.text);
  }
}
