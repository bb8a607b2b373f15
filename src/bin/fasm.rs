/*!
  Assembler driver: assembles a symbolic source file and runs the image.
*/

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use fcpu::{assembler, Cpu};

#[derive(Parser)]
#[command(name = "fasm", about = "Assemble and run an assembly source file")]
struct Args {
  /// Trace the emitted bytes, the symbol table, and execution
  #[arg(short, long)]
  verbose: bool,

  /// Assembly source file
  source: PathBuf,
}

fn main() -> ExitCode {
  let args = Args::parse();

  let obj_path = PathBuf::from(format!("{}.obj", args.source.display()));
  if let Err(error) = assembler::assemble_file(&args.source, &obj_path, args.verbose) {
    eprintln!("{}: {}", args.source.display(), error);
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
    Ok(()) => ExitCode::SUCCESS,
    Err(error) => {
      eprintln!("{}: {}", obj_path.display(), error);
      ExitCode::from(1)
    }
  }
}
