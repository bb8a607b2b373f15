/*!
  The front-end compiler: a line-oriented concatenative source lowered to
  symbolic assembly.

  Two passes. The first collects user labels, colon-definition names, and
  constants, and emits nothing; unknown words are left for the second pass,
  since they may be forward references. The second pass emits assembly into
  two buffers: the main program, and the deferred colon-definition bodies,
  which are appended after the main body at write time so that execution
  from `start:` runs main and reaches definitions only through `call`.

  Each token is resolved in a fixed order: the active `(`/`;CODE` context,
  structural keywords, constants, user labels, dictionary words, and
  finally numeric literals. Anything else is an undefined word.
*/

use std::collections::{HashMap, HashSet};

use either::Either::{Left, Right};
use string_cache::DefaultAtom;

use super::context::{ContextKind, ContextStack};
use super::dictionary::DICTIONARY;
use super::errors::ForthError;
use crate::assembler::lexer::parse_number;
use crate::Word;

// Bounds dictionary expansion so a cyclic definition cannot hang the pass.
const MAXIMUM_EXPANSION_DEPTH: usize = 64;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
enum Pass {
  First,
  Second,
}

/// What the next token is claimed by.
#[derive(Clone, Copy)]
enum Awaiting {
  None,
  ColonName,
  ConstantName(Word),
}

/// The last literal compiled, so `constant` can retract its push.
struct PendingNumber {
  value: Word,
  in_colon: bool,
  len: usize,
}

struct Compiler {
  pass: Pass,
  labels: HashSet<DefaultAtom>,
  constants: HashMap<DefaultAtom, Word>,
  colon_words: HashSet<DefaultAtom>,
  context: ContextStack,
  main: String,
  deferred: String,
  awaiting: Awaiting,
  pending_number: Option<PendingNumber>,
}

impl Compiler {
  fn new(pass: Pass) -> Compiler {
    Compiler {
      pass,
      labels: HashSet::new(),
      constants: HashMap::new(),
      colon_words: HashSet::new(),
      context: ContextStack::new(),
      main: String::new(),
      deferred: String::new(),
      awaiting: Awaiting::None,
      pending_number: None,
    }
  }

  // region Emission

  fn buffer_mut(&mut self) -> &mut String {
    // Colon bodies are deferred and concatenated after the main program.
    match self.context.in_colon() {
      true => &mut self.deferred,
      false => &mut self.main,
    }
  }

  fn emit(&mut self, line: &str) {
    if self.pass == Pass::Second {
      let buffer = self.buffer_mut();
      buffer.push_str(line);
      buffer.push('\n');
    }
  }

  fn buffer_mark(&mut self) -> PendingNumber {
    let in_colon = self.context.in_colon();
    PendingNumber {
      value: 0,
      in_colon,
      len: self.buffer_mut().len(),
    }
  }

  // endregion

  fn run(&mut self, source: &str) -> Result<(), ForthError> {
    for line in source.lines() {
      self.compile_line(line)?;
    }
    match self.awaiting {
      Awaiting::ColonName => return Err(ForthError::MissingColonName),
      Awaiting::ConstantName(_) => return Err(ForthError::MissingConstantName),
      Awaiting::None => {}
    }
    if let Some(frame) = self.context.current() {
      return Err(ForthError::UnbalancedControl(frame.kind.keyword().into()));
    }
    Ok(())
  }

  fn compile_line(&mut self, line: &str) -> Result<(), ForthError> {
    for field in line.split_whitespace() {
      let mut field = field;
      // A parenthesis comment swallows tokens until one carries the `)`;
      // whatever trails the `)` is compiled normally.
      if self.context.is(ContextKind::Paren) {
        match field.find(')') {
          Some(position) => {
            self.context.exit();
            field = &field[position + 1..];
          }
          None => continue,
        }
        if field.is_empty() {
          continue;
        }
      }
      let token = field.to_uppercase();
      if token.starts_with('\\') {
        // Line comment: the rest of the line is ignored.
        break;
      }
      self.compile_token(&token, 0)?;
    }
    Ok(())
  }

  fn compile_token(&mut self, token: &str, depth: usize) -> Result<(), ForthError> {
    if depth > MAXIMUM_EXPANSION_DEPTH {
      return Err(ForthError::ExpansionTooDeep(token.to_lowercase()));
    }

    // Passthrough context: everything up to the closing `;` goes to the
    // assembly stream untouched.
    if self.context.is(ContextKind::Code) {
      if token == ";" {
        self.context.exit();
      } else {
        self.emit(&format!("  {}", token.to_lowercase()));
      }
      return Ok(());
    }

    // A name owed to `:` or `constant` claims the token outright.
    match self.awaiting {
      Awaiting::ColonName => {
        self.awaiting = Awaiting::None;
        let atom = DefaultAtom::from(token);
        if self.pass == Pass::First {
          self.colon_words.insert(atom);
        }
        self.emit(&format!("{}_col:", token.to_lowercase()));
        return Ok(());
      }
      Awaiting::ConstantName(value) => {
        self.awaiting = Awaiting::None;
        if self.pass == Pass::First {
          self.constants.insert(DefaultAtom::from(token), value);
        }
        return Ok(());
      }
      Awaiting::None => {}
    }

    if token == "CONSTANT" {
      // The preceding literal becomes compile-time only: retract its push.
      let pending = self
        .pending_number
        .take()
        .ok_or_else(|| ForthError::UndefinedWord("constant".into()))?;
      if self.pass == Pass::Second {
        let buffer = match pending.in_colon {
          true => &mut self.deferred,
          false => &mut self.main,
        };
        buffer.truncate(pending.len);
      }
      self.awaiting = Awaiting::ConstantName(pending.value);
      return Ok(());
    }
    self.pending_number = None;

    // Structural keywords.
    match token {
      "IF" => {
        let id = self.context.enter(ContextKind::If);
        self.emit(&format!("  not push if_{}_else jnz", id));
        return Ok(());
      }
      "ELSE" => {
        if !self.context.is(ContextKind::If) {
          return Err(ForthError::UnbalancedControl("else".into()));
        }
        let id = self.context.current().map(|frame| frame.id).unwrap_or(0);
        self.emit(&format!("  push if_{}_then jmp", id));
        self.emit(&format!("if_{}_else:", id));
        self.context.change(ContextKind::Else);
        return Ok(());
      }
      "THEN" => {
        let frame = match self.context.current() {
          Some(frame) if frame.kind == ContextKind::If || frame.kind == ContextKind::Else => frame,
          _ => return Err(ForthError::UnbalancedControl("then".into())),
        };
        match frame.kind {
          ContextKind::If => self.emit(&format!("if_{}_else:", frame.id)),
          _ => self.emit(&format!("if_{}_then:", frame.id)),
        }
        self.context.exit();
        return Ok(());
      }
      "DO" => {
        let id = self.context.enter(ContextKind::Do);
        // ( limit index -- ) becomes R: limit index, index on top.
        self.emit("  swap to_r to_r");
        self.emit(&format!("do_{}:", id));
        return Ok(());
      }
      "I" => {
        if self.context.innermost_do().is_none() {
          return Err(ForthError::UnbalancedControl("i".into()));
        }
        self.emit("  r_fetch");
        return Ok(());
      }
      "LOOP" => {
        if !self.context.is(ContextKind::Do) {
          return Err(ForthError::UnbalancedControl("loop".into()));
        }
        let id = self.context.current().map(|frame| frame.id).unwrap_or(0);
        // Restore i and limit, bump i, loop back while i < limit, and
        // finally clear the pair off the return stack.
        self.emit("  r_from r_from swap push 1 add swap over over to_r to_r");
        self.emit(&format!("  lt push do_{} jnz", id));
        self.emit(&format!("do_{}_end:", id));
        self.emit("  r_from drop r_from drop");
        self.context.exit();
        return Ok(());
      }
      "LEAVE" => {
        let frame = self
          .context
          .innermost_do()
          .ok_or_else(|| ForthError::UnbalancedControl("leave".into()))?;
        // Force i up to the limit, then take the exit.
        self.emit("  r_from drop r_fetch to_r");
        self.emit(&format!("  push do_{}_end jmp", frame.id));
        return Ok(());
      }
      ":" => {
        if self.context.in_colon() {
          return Err(ForthError::UnbalancedControl(":".into()));
        }
        self.context.enter(ContextKind::Colon);
        self.awaiting = Awaiting::ColonName;
        return Ok(());
      }
      ";" => {
        if !self.context.is(ContextKind::Colon) {
          return Err(ForthError::UnbalancedControl(";".into()));
        }
        self.emit("  ret");
        self.context.exit();
        return Ok(());
      }
      ";CODE" => {
        self.context.enter(ContextKind::Code);
        return Ok(());
      }
      "(" => {
        self.context.enter(ContextKind::Paren);
        return Ok(());
      }
      _ => {}
    }

    let atom = DefaultAtom::from(token);

    if let Some(value) = self.constants.get(&atom).copied() {
      self.emit(&format!("  push {}", value));
      return Ok(());
    }

    if self.labels.contains(&atom) {
      self.emit(&format!("  push {}", token.to_lowercase()));
      return Ok(());
    }

    if self.colon_words.contains(&atom) {
      self.emit(&format!("  push {}_col call", token.to_lowercase()));
      return Ok(());
    }

    if let Some(entry) = DICTIONARY.get(token) {
      match entry {
        Left(code) => self.emit(&format!("  {}", code)),
        Right(expansion) => {
          for word in expansion.split_whitespace() {
            self.compile_token(word, depth + 1)?;
          }
        }
      }
      return Ok(());
    }

    // A label definition of the form `name:`.
    if let Some(name) = token.strip_suffix(':') {
      if self.pass == Pass::First {
        self.labels.insert(DefaultAtom::from(name));
      }
      self.emit(&format!("{}:", name.to_lowercase()));
      return Ok(());
    }

    match parse_number(&token.to_lowercase()) {
      Some(value) => {
        let mut pending = self.buffer_mark();
        pending.value = value;
        self.emit(&format!("  push {}", value));
        self.pending_number = Some(pending);
        Ok(())
      }
      // Unknown words may be forward references during the first pass.
      None if self.pass == Pass::First => Ok(()),
      None => Err(ForthError::UndefinedWord(token.to_lowercase())),
    }
  }
}

/// Compiles front-end source to assembly text.
pub fn compile(source: &str) -> Result<String, ForthError> {
  let mut first = Compiler::new(Pass::First);
  first.run(source)?;
  // The second pass inherits every table the first one collected.
  let mut second = Compiler::new(Pass::Second);
  second.labels = first.labels;
  second.constants = first.constants;
  second.colon_words = first.colon_words;
  second.run(source)?;

  let mut output = String::with_capacity(second.main.len() + second.deferred.len() + 8);
  output.push_str("start:\n");
  output.push_str(&second.main);
  output.push_str(&second.deferred);
  Ok(output)
}
