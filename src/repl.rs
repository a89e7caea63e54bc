//! Interactive prompt.
//!
//! Reads one line at a time, runs it through the selected backend, and prints
//! the inspected result. Parse failures get the full banner treatment.

use std::io::{BufRead, Write};

use anyhow::Result;

use crate::backend::Backend;
use crate::{lexer, parser};

pub const PROMPT: &str = ">> ";

const MONKEY_FACE: &str = r#"            __,__
   .--.  .-"     "-.  .--.
  / .. \/  .-. .-.  \/ .. \
 | |  '|  /   Y   \  |'  | |
 | \   \  \ 0 | 0 /  /   / |
  \ '- ,\.-"""""""-./, -' /
   ''-' /_   ^ ^   _\ '-''
       |  \._   _./  |
       \   \ '~' /   /
        '._ '-=-' _.'
           '-----'
"#;

/// Runs the prompt loop until EOF or an `exit()` line.
pub fn start(input: &mut dyn BufRead, output: &mut dyn Write, backend: &dyn Backend) -> Result<()> {
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let line = line.trim();
        if line == "exit()" {
            writeln!(output, "Goodbye!")?;
            return Ok(());
        }
        if line.is_empty() {
            continue;
        }

        let parsed = lexer::tokenize(line)
            .map_err(anyhow::Error::from)
            .and_then(parser::parse_tokens);
        let program = match parsed {
            Ok(program) => program,
            Err(error) => {
                print_parse_error(output, &error)?;
                continue;
            }
        };

        match backend.run(&program) {
            Ok(result) => writeln!(output, "{}", result.inspect())?,
            Err(error) => writeln!(output, "{error}")?,
        }
    }
}

fn print_parse_error(output: &mut dyn Write, error: &anyhow::Error) -> Result<()> {
    writeln!(output, "{MONKEY_FACE}")?;
    writeln!(output, "Woops! We ran into some monkey business here!")?;
    writeln!(output, "parser errors:")?;
    writeln!(output, "\t{error}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Evaluator;
    use crate::vm::VmBackend;
    use std::io::Cursor;

    fn run_session(backend: &dyn Backend, session: &str) -> String {
        let mut input = Cursor::new(session.as_bytes().to_vec());
        let mut output = Vec::new();
        start(&mut input, &mut output, backend).expect("repl session failed");
        String::from_utf8(output).expect("repl output should be utf8")
    }

    #[test]
    fn evaluates_lines_and_prints_inspect() {
        let output = run_session(&Evaluator::new(), "5 + 5\n!true\nexit()\n");
        assert!(output.contains("10"));
        assert!(output.contains("False"));
        assert!(output.ends_with("Goodbye!\n"));
    }

    #[test]
    fn runs_against_the_vm_backend_too() {
        let output = run_session(&VmBackend::new(), "if (1 < 2) { 10 } else { 20 }\n");
        assert!(output.contains("10"));
    }

    #[test]
    fn prints_banner_on_parse_error() {
        let output = run_session(&Evaluator::new(), "if (true { 10 }\n");
        assert!(output.contains("monkey business"));
        assert!(output.contains("parser errors:"));
        assert!(output.contains("Expected )"));
    }

    #[test]
    fn prints_runtime_errors_in_band_for_the_evaluator() {
        let output = run_session(&Evaluator::new(), "5 + true\n");
        assert!(output.contains("ERROR: type mismatch: INTEGER + BOOLEAN"));
    }

    #[test]
    fn prints_vm_errors_from_the_error_channel() {
        let output = run_session(&VmBackend::new(), "5 + true\n");
        assert!(output.contains("unsupported types for binary operation: INTEGER BOOLEAN"));
    }

    #[test]
    fn skips_blank_lines_and_stops_at_eof() {
        let output = run_session(&Evaluator::new(), "\n\n7\n");
        assert!(output.contains("7"));
        assert!(!output.contains("Goodbye!"));
    }
}
