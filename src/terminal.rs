/*!
  Memory-mapped terminal.

  The device exposes a 10-byte window at the top of the address space with
  two word cells: offset 0 is the `ready` flag, offset 4 the output
  character. A host timer thread samples `ready` about once a millisecond;
  when it finds it non-zero it writes the output byte to stdout and clears
  the flag. Guest writes happen only between instructions and the thread
  takes the cell mutex for the whole check-emit-clear step, so each side
  always sees a consistent pair.
*/

use std::io::Write as _;
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Duration;

use crate::bus::Device;
use crate::{Addr, Word, MEMORY_LIMIT};

pub const TERMINAL_WINDOW: Addr = 10;

const READY_OFFSET: Addr = 0;
const OUT_OFFSET: Addr = 4;

const TICK: Duration = Duration::from_millis(1);

struct Cells {
  ready: Word,
  out: Word,
}

pub struct Terminal {
  start: Addr,
  cells: Arc<Mutex<Cells>>,
}

impl Terminal {
  pub fn new() -> Terminal {
    let cells = Arc::new(Mutex::new(Cells { ready: 0, out: 0 }));
    let clock_cells = Arc::downgrade(&cells);
    thread::spawn(move || Terminal::clock(clock_cells));
    Terminal {
      start: MEMORY_LIMIT,
      cells,
    }
  }

  // The thread holds only a weak reference; once the device is dropped the
  // upgrade fails and the clock winds down.
  fn clock(cells: Weak<Mutex<Cells>>) {
    loop {
      thread::sleep(TICK);
      let cells = match cells.upgrade() {
        Some(cells) => cells,
        None => return,
      };
      let mut cells = match cells.lock() {
        Ok(cells) => cells,
        Err(_) => return,
      };
      if cells.ready != 0 {
        print!("{}", (cells.out as u8) as char);
        std::io::stdout().flush().ok();
        cells.ready = 0;
      }
    }
  }
}

impl Device for Terminal {
  fn start(&self) -> Addr {
    self.start
  }

  fn end(&self) -> Addr {
    self.start + TERMINAL_WINDOW
  }

  fn read_word(&mut self, offset: Addr) -> Word {
    match offset {
      READY_OFFSET => self.cells.lock().map(|cells| cells.ready).unwrap_or(0),
      _ => 0,
    }
  }

  fn write_word(&mut self, offset: Addr, value: Word) {
    if let Ok(mut cells) = self.cells.lock() {
      match offset {
        READY_OFFSET => cells.ready = value,
        OUT_OFFSET => cells.out = value,
        _ => {}
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn window_layout() {
    let terminal = Terminal::new();
    assert_eq!(terminal.start(), MEMORY_LIMIT);
    assert_eq!(terminal.end(), MEMORY_LIMIT + 10);
  }

  #[test]
  fn ready_flag_reads_back_and_is_cleared_by_the_clock() {
    let mut terminal = Terminal::new();
    terminal.write_word(OUT_OFFSET, '\n' as Word);
    terminal.write_word(READY_OFFSET, -1);
    assert_ne!(terminal.read_word(READY_OFFSET), 0);
    // The clock ticks every millisecond; give it a few.
    for _ in 0..100 {
      if terminal.read_word(READY_OFFSET) == 0 {
        return;
      }
      thread::sleep(Duration::from_millis(2));
    }
    panic!("ready flag was never cleared");
  }

  #[test]
  fn out_of_window_offsets_read_zero() {
    let mut terminal = Terminal::new();
    assert_eq!(terminal.read_word(8), 0);
  }
}
