// weft-import: compile a text transducer into the binary model format.
//
// Usage:
//   weft-import [OPTIONS] TEXT_FILE BINARY_FILE
//
// Options:
//   --semiring KIND    Weight interpretation: tropical (default), log,
//                      probability. Stored in the binary header.
//   --isymbols FILE    Attach an input symbol table (symbol<TAB>id lines)
//   --osymbols FILE    Attach an output symbol table
//   -h, --help         Print help
//
// The output is written to a temp file and renamed into place, so a failed
// run never leaves a partial model behind.

use std::path::Path;

use weft_core::fst::MutableFst;
use weft_core::semiring::{
    LogSemiring, ProbabilitySemiring, SemiringKind, StdSemiring, TropicalSemiring,
};
use weft_io::{binary, text};

const USAGE: &str = "weft-import [--semiring KIND] [--isymbols FILE] [--osymbols FILE] TEXT_FILE BINARY_FILE";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if weft_cli::wants_help(&args) {
        println!("weft-import: compile a text transducer into the binary model format.");
        println!();
        println!("Usage: {USAGE}");
        println!();
        println!("Options:");
        println!("  --semiring KIND    tropical (default), log or probability");
        println!("  --isymbols FILE    Attach an input symbol table");
        println!("  --osymbols FILE    Attach an output symbol table");
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
    let mut fst: MutableFst<S> = text::read_file(Path::new(input))
        .unwrap_or_else(|e| weft_cli::fatal(&format!("reading {input}: {e}")));

    if let Some(path) = isymbols {
        let table = text::read_symbols_file(Path::new(&path))
            .unwrap_or_else(|e| weft_cli::fatal(&format!("reading {path}: {e}")));
        fst.set_input_symbols(table);
    }
    if let Some(path) = osymbols {
        let table = text::read_symbols_file(Path::new(&path))
            .unwrap_or_else(|e| weft_cli::fatal(&format!("reading {path}: {e}")));
        fst.set_output_symbols(table);
    }
    binary::write_file(Path::new(output), &fst)
        .unwrap_or_else(|e| weft_cli::fatal(&format!("writing {output}: {e}")));
}
