use std::fs;
use std::io;

use anyhow::{Context, Result, bail};
use monkey::backend::{self, Backend};
use monkey::{lexer, parser, repl};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut backend_name = "evaluator".to_string();
    let mut input_path: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--backend" | "-b" => {
                backend_name = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("Missing backend name after {arg}"))?;
            }
            _ => {
                input_path = Some(arg);
                if args.next().is_some() {
                    bail!("Only one input file is supported");
                }
                break;
            }
        }
    }

    let backend = find_backend(&backend_name)?;

    match input_path {
        Some(path) => run_file(&path, backend.as_ref()),
        None => {
            let stdin = io::stdin();
            repl::start(&mut stdin.lock(), &mut io::stdout(), backend.as_ref())
        }
    }
}

fn find_backend(name: &str) -> Result<Box<dyn Backend>> {
    for backend in backend::backends() {
        if backend.name() == name {
            return Ok(backend);
        }
    }
    bail!("Unknown backend '{name}'")
}

fn run_file(path: &str, backend: &dyn Backend) -> Result<()> {
    let source = fs::read_to_string(path).with_context(|| format!("Reading {path}"))?;
    let tokens = lexer::tokenize(&source)?;
    let program = parser::parse_tokens(tokens)?;
    let result = backend.run(&program)?;
    println!("{}", result.inspect());
    Ok(())
}
