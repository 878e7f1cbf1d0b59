use std::io::{BufRead, Write};
use std::{env, fs, io};

use anyhow::{bail, Context};

use zero::{init_tracing, Config, LineTable, Runtime, ScopeMode, StructureError};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut config = Config::from_env()?;
    let mut path = None;
    for arg in env::args().skip(1) {
        if arg == "--frames" {
            config.scope = ScopeMode::Frames;
        } else if arg.starts_with("--") {
            bail!("unknown flag '{arg}'");
        } else if path.is_some() {
            bail!("usage: zero [--frames] [FILE]");
        } else {
            path = Some(arg);
        }
    }

    let mut runtime = Runtime::with_config(config, io::stdout());
    match path {
        Some(path) => {
            let source =
                fs::read_to_string(&path).with_context(|| format!("cannot read {path}"))?;
            runtime.run_source(&source)
        }
        None => repl(&mut runtime),
    }
}

/// Reads lines until every block is closed, then runs what was collected.
fn repl(runtime: &mut Runtime) -> anyhow::Result<()> {
    let mut buffer = String::new();
    prompt(">> ")?;
    for line in io::stdin().lock().lines() {
        buffer.push_str(&line?);
        buffer.push('\n');
        if let Err(StructureError::UnclosedBlock { .. }) = LineTable::parse(&buffer) {
            prompt(".. ")?;
            continue;
        }
        if let Err(error) = runtime.run_source(&buffer) {
            println!("!! {error}\n");
        }
        buffer.clear();
        prompt(">> ")?;
    }
    Ok(())
}

fn prompt(text: &str) -> io::Result<()> {
    print!("{text}");
    io::stdout().flush()
}
