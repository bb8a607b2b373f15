/*!
  A three-stage toolchain around a small stack-machine processor:

  ```text
  source text --[forth]--> assembly text --[assembler]--> binary image --[cpu]--> execution
  ```

  The front-end (`forth`) lowers a concatenative word-dictionary language to
  symbolic assembly. The two-pass `assembler` turns assembly with labels,
  segments, and data directives into a loadable image. The `cpu` interprets
  byte opcodes over a paged 2³² address space with two bus-backed stacks and
  memory-mapped devices.
*/

#[macro_use]
extern crate prettytable;
#[macro_use]
extern crate lazy_static;
extern crate strum;

pub mod assembler;
pub mod bus;
pub mod cpu;
pub mod errors;
pub mod forth;
pub mod image;
pub mod mmu;
pub mod opcode;
pub mod stack;
pub mod terminal;

/// Machine word. All arithmetic is two's-complement wrap.
pub type Word = i32;

/// Byte address into the virtual address space.
pub type Addr = u32;

pub const WORD_SIZE: Addr = 4;

/// Initial top of the data stack. The stack grows downward from here.
pub const DATA_STACK_TOP: Addr = 1 << 16;

/// Initial top of the return stack.
pub const RETURN_STACK_TOP: Addr = 1 << 15;

/// Base of the device window. Everything below is paged memory.
pub const MEMORY_LIMIT: Addr = 0xFFFF_FC00;

/// Base address of the text segment of a loaded image.
pub const TEXT_SEGMENT: Addr = 0x0804_8100;

/// Base address of the data segment of a loaded image.
pub const DATA_SEGMENT: Addr = 0x0807_4000;

/// Magic number identifying an executable image.
pub const BINARY_MAGIC: u32 = 0xC9F7_A115;

pub use crate::cpu::Cpu;
pub use crate::errors::VmError;
pub use crate::image::Image;
