// weft-cli: shared utilities for the import/export tools.

use std::process;

use weft_core::semiring::SemiringKind;

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}

/// Parse a `--semiring=KIND` or `--semiring KIND` argument. Defaults to
/// tropical. Returns `(kind, remaining_args)`.
pub fn parse_semiring(args: &[String]) -> (SemiringKind, Vec<String>) {
    let (value, remaining) = parse_value_flag(args, "--semiring");
    let kind = match value.as_deref() {
        None | Some("tropical") => SemiringKind::Tropical,
        Some("log") => SemiringKind::Log,
        Some("probability") => SemiringKind::Probability,
        Some(other) => fatal(&format!(
            "unknown semiring {other:?} (expected tropical, log or probability)"
        )),
    };
    (kind, remaining)
}

/// Parse a `FLAG=VALUE` or `FLAG VALUE` argument pair out of `args`.
/// Returns `(value, remaining_args)`.
pub fn parse_value_flag(args: &[String], flag: &str) -> (Option<String>, Vec<String>) {
    let prefix = format!("{flag}=");
    let mut value = None;
    let mut remaining = Vec::new();
    let mut skip_next = false;

    for (i, arg) in args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if let Some(v) = arg.strip_prefix(&prefix) {
            value = Some(v.to_string());
        } else if arg == flag {
            if i + 1 < args.len() {
                value = Some(args[i + 1].clone());
                skip_next = true;
            } else {
                fatal(&format!("{flag} requires a value"));
            }
        } else {
            remaining.push(arg.clone());
        }
    }

    (value, remaining)
}

/// The two positional file arguments every tool takes.
pub fn two_paths(args: &[String], usage: &str) -> (String, String) {
    match args {
        [input, output] => (input.clone(), output.clone()),
        _ => fatal(&format!(
            "expected exactly two file arguments, got {}\nusage: {usage}",
            args.len()
        )),
    }
}
