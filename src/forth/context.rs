/*!
  The nesting context of the front-end compiler.

  Every control structure opens a frame (`IF`, `DO`, `:`, `(`, `;CODE`) and
  its closer pops it. Each frame carries a sequence id, unique per kind,
  used to generate the labels of the structure (`if_3_else`, `do_1_end`,
  and so on). `ELSE` changes the kind of the open `IF` frame in place and
  keeps its id, so `THEN` knows which closing label is still owed.
*/

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ContextKind {
  If,
  Else,
  Do,
  Colon,
  Paren,
  Code,
}

impl ContextKind {
  /// The source keyword that opened the frame, for error messages.
  pub fn keyword(self) -> &'static str {
    match self {
      ContextKind::If | ContextKind::Else => "if",
      ContextKind::Do => "do",
      ContextKind::Colon => ":",
      ContextKind::Paren => "(",
      ContextKind::Code => ";code",
    }
  }
}

#[derive(Clone, Copy, Debug)]
pub struct Frame {
  pub kind: ContextKind,
  pub id: usize,
}

pub struct ContextStack {
  frames: Vec<Frame>,
  ids: HashMap<ContextKind, usize>,
}

impl ContextStack {
  pub fn new() -> ContextStack {
    ContextStack {
      frames: Vec::new(),
      ids: HashMap::new(),
    }
  }

  /// Opens a frame and returns its fresh id.
  pub fn enter(&mut self, kind: ContextKind) -> usize {
    let id = self.ids.entry(kind).and_modify(|id| *id += 1).or_insert(1);
    let id = *id;
    self.frames.push(Frame { kind, id });
    id
  }

  pub fn exit(&mut self) -> Option<Frame> {
    self.frames.pop()
  }

  pub fn current(&self) -> Option<Frame> {
    self.frames.last().copied()
  }

  pub fn is(&self, kind: ContextKind) -> bool {
    matches!(self.current(), Some(frame) if frame.kind == kind)
  }

  /// Changes the kind of the current frame, keeping its id.
  pub fn change(&mut self, kind: ContextKind) {
    if let Some(frame) = self.frames.last_mut() {
      frame.kind = kind;
    }
  }

  /// The nearest enclosing `DO` frame, if any.
  pub fn innermost_do(&self) -> Option<Frame> {
    self
      .frames
      .iter()
      .rev()
      .find(|frame| frame.kind == ContextKind::Do)
      .copied()
  }

  /// True while compiling a colon-definition body.
  pub fn in_colon(&self) -> bool {
    self
      .frames
      .iter()
      .any(|frame| frame.kind == ContextKind::Colon)
  }

  pub fn is_empty(&self) -> bool {
    self.frames.is_empty()
  }
}
