/*!
  The assembly lexer: a stream of tokens from a character cursor.

  Tokens are separated by whitespace and carry the line (0-based, counted as
  newlines are consumed) they start on. Comments run from `;` or `#` to the
  end of the line. Identifiers and directives are uppercased on the way in;
  an identifier followed by `:` is a label, and an identifier that names a
  mnemonic becomes an instruction token.
*/

use std::iter::Peekable;
use std::str::Chars;
use std::str::FromStr;

use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{char as one_char, digit1, hex_digit1, oct_digit1};
use nom::combinator::{all_consuming, map, map_res, opt};
use nom::sequence::{pair, preceded};
use nom::IResult;

use super::errors::AsmError;
use crate::opcode::Op;
use crate::Word;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenKind {
  Directive,
  Identifier,
  Instruction(Op),
  Label,
  Number,
  Str,
}

#[derive(Clone, Debug)]
pub struct Token {
  pub kind: TokenKind,
  pub symbol: String,
  pub line: usize,
}

impl Token {
  fn new(kind: TokenKind, symbol: String, line: usize) -> Token {
    Token { kind, symbol, line }
  }
}

fn is_identifier_char(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '.'
}

pub struct Lexer<'t> {
  chars: Peekable<Chars<'t>>,
  line: usize,
}

impl<'t> Lexer<'t> {
  pub fn new(text: &'t str) -> Lexer<'t> {
    Lexer {
      chars: text.chars().peekable(),
      line: 0,
    }
  }

  fn peek(&mut self) -> Option<char> {
    self.chars.peek().copied()
  }

  fn bump(&mut self) -> Option<char> {
    let ch = self.chars.next();
    if ch == Some('\n') {
      self.line += 1;
    }
    ch
  }

  fn skip_whitespace(&mut self) {
    while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
      self.bump();
    }
  }

  fn skip_comment(&mut self) {
    while !matches!(self.peek(), None | Some('\n')) {
      self.bump();
    }
  }

  /// The next token, or `None` at end of input.
  pub fn next_token(&mut self) -> Result<Option<Token>, AsmError> {
    self.skip_whitespace();
    while matches!(self.peek(), Some(';') | Some('#')) {
      self.skip_comment();
      self.skip_whitespace();
    }
    match self.peek() {
      None => Ok(None),
      Some('"') => self.read_string().map(Some),
      Some('.') => self.read_directive().map(Some),
      Some(ch) if ch.is_ascii_digit() || ch == '-' => self.read_number().map(Some),
      Some(ch) if is_identifier_char(ch) => self.read_identifier().map(Some),
      Some(ch) => Err(AsmError::UnexpectedCharacter {
        found: ch,
        line: self.line,
      }),
    }
  }

  fn read_directive(&mut self) -> Result<Token, AsmError> {
    let line = self.line;
    let mut symbol = String::new();
    symbol.push(self.bump().unwrap_or('.'));
    while matches!(self.peek(), Some(ch) if is_identifier_char(ch)) {
      symbol.push(self.bump().unwrap_or_default());
    }
    Ok(Token::new(TokenKind::Directive, symbol.to_uppercase(), line))
  }

  fn read_number(&mut self) -> Result<Token, AsmError> {
    let line = self.line;
    let mut symbol = String::new();
    let mut base = 10;
    if self.peek() == Some('-') {
      symbol.push(self.bump().unwrap_or_default());
    }
    if self.peek() == Some('0') {
      symbol.push(self.bump().unwrap_or_default());
      match self.peek() {
        Some('x') => {
          base = 16;
          symbol.push(self.bump().unwrap_or_default());
        }
        Some('o') => {
          base = 8;
          symbol.push(self.bump().unwrap_or_default());
        }
        _ => {}
      }
    }
    while matches!(self.peek(), Some(ch) if ch.is_digit(base)) {
      symbol.push(self.bump().unwrap_or_default());
    }
    Ok(Token::new(TokenKind::Number, symbol, line))
  }

  fn read_string(&mut self) -> Result<Token, AsmError> {
    let line = self.line;
    let mut symbol = String::new();
    self.bump(); // opening quote
    loop {
      let mut ch = match self.bump() {
        None => return Err(AsmError::UnmatchedDelimiter { line: self.line }),
        Some('"') => break,
        Some(ch) => ch,
      };
      if ch == '\\' {
        ch = match self.bump() {
          None => return Err(AsmError::UnmatchedDelimiter { line: self.line }),
          Some('\n') => continue, // escaped newline joins the lines
          Some('0') => '\0',
          Some('n') => '\n',
          Some('r') => '\r',
          Some('t') => '\t',
          Some(other) => other,
        };
      }
      symbol.push(ch);
    }
    Ok(Token::new(TokenKind::Str, symbol, line))
  }

  fn read_identifier(&mut self) -> Result<Token, AsmError> {
    let line = self.line;
    let mut symbol = String::new();
    while matches!(self.peek(), Some(ch) if is_identifier_char(ch)) {
      symbol.push(self.bump().unwrap_or_default());
    }
    let symbol = symbol.to_uppercase();
    if self.peek() == Some(':') {
      self.bump();
      return Ok(Token::new(TokenKind::Label, symbol, line));
    }
    match Op::from_str(&symbol) {
      Ok(op) => Ok(Token::new(TokenKind::Instruction(op), symbol, line)),
      Err(_) => Ok(Token::new(TokenKind::Identifier, symbol, line)),
    }
  }
}

// Numeric literals: an optional leading `-`, then `0x…` hex, `0o…` octal,
// or decimal. Values are read as i64 and truncated to the machine word so
// that unsigned forms like 0xFFFFFFFF land on the expected bit pattern.

fn unsigned(input: &str) -> IResult<&str, i64> {
  alt((
    map_res(preceded(tag_no_case("0x"), hex_digit1), |digits: &str| {
      i64::from_str_radix(digits, 16)
    }),
    map_res(preceded(tag_no_case("0o"), oct_digit1), |digits: &str| {
      i64::from_str_radix(digits, 8)
    }),
    map_res(digit1, |digits: &str| digits.parse::<i64>()),
  ))(input)
}

/// Parses a numeric literal, or `None` if the text is not one.
pub fn parse_number(text: &str) -> Option<Word> {
  let signed = map(pair(opt(one_char('-')), unsigned), |(sign, value)| {
    if sign.is_some() {
      -value
    } else {
      value
    }
  });
  let result: IResult<&str, i64> = all_consuming(signed)(text);
  match result {
    Ok((_, value)) => Some(value as Word),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn collect(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token().unwrap() {
      tokens.push(token);
    }
    tokens
  }

  fn check(source: &str, expected: &[(TokenKind, &str, usize)]) {
    let tokens = collect(source);
    assert_eq!(tokens.len(), expected.len());
    for (token, (kind, symbol, line)) in tokens.iter().zip(expected) {
      assert_eq!(&token.kind, kind, "kind of {}", symbol);
      assert_eq!(token.symbol, *symbol);
      assert_eq!(token.line, *line, "line of {}", symbol);
    }
  }

  #[test]
  fn a_whole_program_lexes() {
    let tokens = collect(
      "
start:
    push 100 push 10
    max
    print call
    hlt

print:
    emit
    ret
",
    );
    assert_eq!(tokens.len(), 12);
    assert!(matches!(tokens[0].kind, TokenKind::Label));
  }

  #[test]
  fn comments_reach_end_of_line() {
    check("\n; comment 1\n# comment 2", &[]);
    check(
      "nop ; trailing\nnop",
      &[
        (TokenKind::Instruction(Op::Nop), "NOP", 0),
        (TokenKind::Instruction(Op::Nop), "NOP", 1),
      ],
    );
  }

  #[test]
  fn labels() {
    check(
      "\nlabel1:\nlabel2:\n",
      &[
        (TokenKind::Label, "LABEL1", 1),
        (TokenKind::Label, "LABEL2", 2),
      ],
    );
  }

  #[test]
  fn strings_and_escapes() {
    check(
      "\nlabel1: .asciz \"String\"\nlabel2: .asciz \"tab\\ttab\"\nlabel3: .asciz \"multiline \\\nstring\"\n",
      &[
        (TokenKind::Label, "LABEL1", 1),
        (TokenKind::Directive, ".ASCIZ", 1),
        (TokenKind::Str, "String", 1),
        (TokenKind::Label, "LABEL2", 2),
        (TokenKind::Directive, ".ASCIZ", 2),
        (TokenKind::Str, "tab\ttab", 2),
        (TokenKind::Label, "LABEL3", 3),
        (TokenKind::Directive, ".ASCIZ", 3),
        (TokenKind::Str, "multiline string", 3),
      ],
    );
  }

  #[test]
  fn numbers() {
    check(
      "\n    1 1000 ADD\n    0x1a -1 MUL\n    PUSH 0xabcd\n    PUSH 000\n",
      &[
        (TokenKind::Number, "1", 1),
        (TokenKind::Number, "1000", 1),
        (TokenKind::Instruction(Op::Add), "ADD", 1),
        (TokenKind::Number, "0x1a", 2),
        (TokenKind::Number, "-1", 2),
        (TokenKind::Instruction(Op::Mul), "MUL", 2),
        (TokenKind::Instruction(Op::Push), "PUSH", 3),
        (TokenKind::Number, "0xabcd", 3),
        (TokenKind::Instruction(Op::Push), "PUSH", 4),
        (TokenKind::Number, "000", 4),
      ],
    );
  }

  #[test]
  fn unterminated_string_is_an_error() {
    let mut lexer = Lexer::new("\n.asciz \"Open\\\n");
    lexer.next_token().unwrap();
    assert!(matches!(
      lexer.next_token(),
      Err(AsmError::UnmatchedDelimiter { .. })
    ));
  }

  #[test]
  fn illegal_character_is_an_error() {
    let mut lexer = Lexer::new("nop !");
    lexer.next_token().unwrap();
    assert!(matches!(
      lexer.next_token(),
      Err(AsmError::UnexpectedCharacter { found: '!', .. })
    ));
  }

  #[test]
  fn number_parsing() {
    assert_eq!(parse_number("42"), Some(42));
    assert_eq!(parse_number("-42"), Some(-42));
    assert_eq!(parse_number("0x1a"), Some(26));
    assert_eq!(parse_number("0X1A"), Some(26));
    assert_eq!(parse_number("0o17"), Some(15));
    assert_eq!(parse_number("-0x10"), Some(-16));
    assert_eq!(parse_number("0xffffffff"), Some(-1));
    assert_eq!(parse_number("000"), Some(0));
    assert_eq!(parse_number(""), None);
    assert_eq!(parse_number("-"), None);
    assert_eq!(parse_number("12ab"), None);
    assert_eq!(parse_number("label"), None);
  }
}
