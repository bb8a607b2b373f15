/*!
  Front-end driver: compiles a source file to assembly, assembles it, and
  runs the result.
*/

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use fcpu::{assembler, forth, Cpu};

#[derive(Parser)]
#[command(name = "forth", about = "Compile and run a concatenative source file")]
struct Args {
  /// Trace execution and print the memory map on exit
  #[arg(short, long)]
  verbose: bool,

  /// Source file
  source: PathBuf,
}

fn main() -> ExitCode {
  let args = Args::parse();

  let asm_path = PathBuf::from(format!("{}.pal", args.source.display()));
  if let Err(error) = forth::compile_file(&args.source, &asm_path) {
    eprintln!("{}: {}", args.source.display(), error);
    return ExitCode::from(1);
  }

  let obj_path = PathBuf::from(format!("{}.obj", args.source.display()));
  if let Err(error) = assembler::assemble_file(&asm_path, &obj_path, args.verbose) {
    eprintln!("{}: {}", asm_path.display(), error);
    return ExitCode::from(1);
  }

  let mut cpu = match Cpu::load(&obj_path) {
    Ok(cpu) => cpu,
    Err(error) => {
      eprintln!("{}: {}", obj_path.display(), error);
      return ExitCode::from(1);
    }
  };
  cpu.verbose = args.verbose;
  match cpu.run() {
    Ok(()) => {
      if args.verbose {
        cpu.print_memory();
      }
      ExitCode::SUCCESS
    }
    Err(error) => {
      eprintln!("{}: {}", obj_path.display(), error);
      ExitCode::from(1)
    }
  }
}
