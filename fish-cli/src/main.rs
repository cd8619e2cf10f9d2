use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use fish_io::{rng_policy, InputMode, StdIo};
use fish_vm::{loader, Stack, Vm};

/// ><> (Fish) script runner
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Script files to run in order, each inheriting the previous
    /// script's value stack
    scripts: Vec<PathBuf>,

    /// Inline script, executed before any file arguments
    #[clap(short, long)]
    code: Option<String>,

    /// Read stdin as UTF-8 codepoints instead of raw bytes
    #[clap(short, long)]
    utf8: bool,

    /// Disable the PRNG, making `x` a no-op
    #[clap(long)]
    no_prng: bool,
}

fn main() {
    let env = env_logger::Env::default()
        .filter_or("FISH_LOG", "info")
        .write_style_or("FISH_LOG", "always");
    env_logger::init_from_env(env);

    if let Err(err) = run() {
        log::error!("{err:#}");
        eprintln!("something smells fishy...");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    if args.code.is_none() && args.scripts.is_empty() {
        bail!("no script given");
    }

    let mode = if args.utf8 { InputMode::Utf8 } else { InputMode::Byte };
    let mut io = StdIo::new(mode);
    let mut stack = Stack::new();

    let start = std::time::Instant::now();

    if let Some(code) = &args.code {
        stack = run_script(code, stack, args.no_prng, &mut io)?;
    }

    for path in &args.scripts {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {:?}", path))?;
        stack = run_script(&source, stack, args.no_prng, &mut io)?;
    }

    info!("finished in {:?}", start.elapsed());
    Ok(())
}

/// Runs one script through a fresh [`Vm`], seeded with `stack` as its
/// initial current stack, returning the stack it terminates with.
fn run_script(
    source: &str,
    stack: Stack,
    no_prng: bool,
    io: &mut StdIo,
) -> Result<Stack> {
    let grid = loader::parse(source);
    let mut vm = Vm::new(grid, stack, rng_policy(no_prng));
    Ok(vm.run(io)?)
}
