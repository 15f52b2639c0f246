// weft-export: dump a binary transducer model back to the text format.
//
// Usage:
//   weft-export [OPTIONS] BINARY_FILE TEXT_FILE
//
// Options:
//   --semiring KIND    Expected weight interpretation: tropical (default),
//                      log, probability. Must match the binary header.
//   --isymbols FILE    Also write the input symbol table here
//   --osymbols FILE    Also write the output symbol table here
//   -h, --help         Print help

use std::path::Path;

use weft_core::fst::{FstView, MutableFst};
use weft_core::semiring::{
    LogSemiring, ProbabilitySemiring, SemiringKind, StdSemiring, TropicalSemiring,
};
use weft_io::{binary, text};

const USAGE: &str = "weft-export [--semiring KIND] [--isymbols FILE] [--osymbols FILE] BINARY_FILE TEXT_FILE";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if weft_cli::wants_help(&args) {
        println!("weft-export: dump a binary transducer model back to the text format.");
        println!();
        println!("Usage: {USAGE}");
        println!();
        println!("Options:");
        println!("  --semiring KIND    tropical (default), log or probability");
        println!("  --isymbols FILE    Also write the input symbol table");
        println!("  --osymbols FILE    Also write the output symbol table");
        println!("  -h, --help         Print this help");
        return;
    }

    let (kind, args) = weft_cli::parse_semiring(&args);
    let (isymbols, args) = weft_cli::parse_value_flag(&args, "--isymbols");
    let (osymbols, args) = weft_cli::parse_value_flag(&args, "--osymbols");
    let (input, output) = weft_cli::two_paths(&args, USAGE);

    match kind {
        SemiringKind::Tropical => run::<TropicalSemiring>(&input, &output, isymbols, osymbols),
        SemiringKind::Log => run::<LogSemiring>(&input, &output, isymbols, osymbols),
        SemiringKind::Probability => {
            run::<ProbabilitySemiring>(&input, &output, isymbols, osymbols)
        }
    }
}

fn run<S: StdSemiring>(
    input: &str,
    output: &str,
    isymbols: Option<String>,
    osymbols: Option<String>,
) {
    let fst: MutableFst<S> = binary::read_file(Path::new(input))
        .unwrap_or_else(|e| weft_cli::fatal(&format!("reading {input}: {e}")));

    text::write_file(Path::new(output), &fst)
        .unwrap_or_else(|e| weft_cli::fatal(&format!("writing {output}: {e}")));

    if let Some(path) = isymbols {
        text::write_symbols_file(Path::new(&path), fst.input_symbols())
            .unwrap_or_else(|e| weft_cli::fatal(&format!("writing {path}: {e}")));
    }
    if let Some(path) = osymbols {
        text::write_symbols_file(Path::new(&path), fst.output_symbols())
            .unwrap_or_else(|e| weft_cli::fatal(&format!("writing {path}: {e}")));
    }
}
