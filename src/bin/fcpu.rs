/*!
  Machine driver: loads an executable image and runs it.
*/

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use fcpu::Cpu;

#[derive(Parser)]
#[command(name = "fcpu", about = "Run an executable image")]
struct Args {
  /// Trace execution and print the memory map on exit
  #[arg(short, long)]
  verbose: bool,

  /// Executable image
  image: PathBuf,
}

fn main() -> ExitCode {
  let args = Args::parse();

  let mut cpu = match Cpu::load(&args.image) {
    Ok(cpu) => cpu,
    Err(error) => {
      eprintln!("{}: {}", args.image.display(), error);
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
      eprintln!("{}: {}", args.image.display(), error);
      ExitCode::from(1)
    }
  }
}
