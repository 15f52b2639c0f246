// OpenFST-style text format.
//
// One arc per line, `src dst ilabel olabel [weight]`, and one line per
// final state, `state [weight]`; a missing weight means the semiring one.
// Fields are whitespace-separated, labels and states are numeric ids, and
// the source state of the first line is the start state. Symbol tables
// travel in separate `symbol<TAB>id` files.
//
// Like the reference format, a state that is neither final nor an arc
// endpoint does not survive the trip; the binary format is the lossless
// one.

use std::fmt::Write as _;
use std::path::Path;

use weft_core::arc::StateId;
use weft_core::error::FstError;
use weft_core::fst::{FstView, MutableFst};
use weft_core::semiring::{Semiring, StdSemiring};
use weft_core::symbols::SymbolTable;

use crate::{IoError, write_atomic};

// ---------------------------------------------------------------------------
// Transducers
// ---------------------------------------------------------------------------

/// Render a transducer as text. The start state's lines come first so the
/// loader can recover it. Fails on a non-empty machine without a start.
pub fn to_text<S: StdSemiring>(fst: &MutableFst<S>) -> Result<String, IoError> {
    let ring = fst.semiring();
    let mut out = String::new();
    if fst.num_states() == 0 {
        return Ok(out);
    }
    let start = fst.require_start().map_err(IoError::Model)?;

    let mut order: Vec<StateId> = (0..fst.num_states() as StateId).collect();
    order.retain(|&s| s != start);
    order.insert(0, start);

    for &s in &order {
        for arc in fst.arcs(s) {
            let _ = write!(out, "{s}\t{}\t{}\t{}", arc.next_state, arc.ilabel, arc.olabel);
            if !ring.is_one(&arc.weight) {
                let _ = write!(out, "\t{}", arc.weight);
            }
            out.push('\n');
        }
        if fst.is_final(s) {
            let fw = fst.final_weight(s);
            if ring.is_one(fw) {
                let _ = writeln!(out, "{s}");
            } else {
                let _ = writeln!(out, "{s}\t{fw}");
            }
        }
    }
    Ok(out)
}

/// Parse the text format. States are created on demand; the first line's
/// source state becomes the start state.
pub fn from_text<S: StdSemiring>(text: &str) -> Result<MutableFst<S>, IoError> {
    let ring = S::default();
    let mut fst = MutableFst::new(ring.clone());

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let fields: Vec<&str> = raw.split_whitespace().collect();
        match fields.as_slice() {
            [] => continue,
            [state] | [state, _] => {
                let s = parse_state(state, line)?;
                ensure_state(&mut fst, s);
                let weight = match fields.get(1) {
                    Some(w) => parse_weight(&ring, w, line)?,
                    None => ring.one(),
                };
                fst.set_final(s, weight)?;
                if fst.start().is_none() {
                    fst.set_start(s)?;
                }
            }
            [src, dst, ilabel, olabel] | [src, dst, ilabel, olabel, _] => {
                let src = parse_state(src, line)?;
                let dst = parse_state(dst, line)?;
                ensure_state(&mut fst, src.max(dst));
                let ilabel = parse_label(ilabel, line)?;
                let olabel = parse_label(olabel, line)?;
                let weight = match fields.get(4) {
                    Some(w) => parse_weight(&ring, w, line)?,
                    None => ring.one(),
                };
                fst.add_arc(src, ilabel, olabel, weight, dst)?;
                if fst.start().is_none() {
                    fst.set_start(src)?;
                }
            }
            _ => {
                return Err(IoError::MalformedText {
                    line,
                    reason: format!("expected 1-2 or 4-5 fields, got {}", fields.len()),
                });
            }
        }
    }
    Ok(fst)
}

pub fn write_file<S: StdSemiring>(path: &Path, fst: &MutableFst<S>) -> Result<(), IoError> {
    write_atomic(path, to_text(fst)?.as_bytes())
}

pub fn read_file<S: StdSemiring>(path: &Path) -> Result<MutableFst<S>, IoError> {
    from_text(&std::fs::read_to_string(path)?)
}

// ---------------------------------------------------------------------------
// Symbol tables
// ---------------------------------------------------------------------------

/// Render a symbol table as `symbol<TAB>id` lines in id order.
pub fn symbols_to_text(table: &SymbolTable) -> String {
    let mut out = String::new();
    for (id, symbol) in table.iter() {
        let _ = writeln!(out, "{symbol}\t{id}");
    }
    out
}

/// Parse `symbol<TAB>id` lines. Ids must be dense and in order, matching
/// how the table assigns them.
pub fn symbols_from_text(text: &str) -> Result<SymbolTable, IoError> {
    let mut table = SymbolTable::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let mut fields = raw.split_whitespace();
        let (Some(symbol), Some(id), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(IoError::MalformedText {
                line,
                reason: "expected `symbol<TAB>id`".to_string(),
            });
        };
        let id: u32 = id.parse().map_err(|_| IoError::MalformedText {
            line,
            reason: format!("invalid id {id:?}"),
        })?;
        let assigned = table.get_or_add(symbol);
        if assigned != id {
            return Err(IoError::MalformedText {
                line,
                reason: format!("symbol {symbol:?} has id {id}, expected {assigned}"),
            });
        }
    }
    Ok(table)
}

pub fn write_symbols_file(path: &Path, table: &SymbolTable) -> Result<(), IoError> {
    write_atomic(path, symbols_to_text(table).as_bytes())
}

pub fn read_symbols_file(path: &Path) -> Result<SymbolTable, IoError> {
    symbols_from_text(&std::fs::read_to_string(path)?)
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

fn parse_state(field: &str, line: usize) -> Result<StateId, IoError> {
    field.parse().map_err(|_| IoError::MalformedText {
        line,
        reason: format!("invalid state id {field:?}"),
    })
}

fn parse_label(field: &str, line: usize) -> Result<u32, IoError> {
    field.parse().map_err(|_| IoError::MalformedText {
        line,
        reason: format!("invalid label {field:?}"),
    })
}

fn parse_weight<S: StdSemiring>(ring: &S, field: &str, line: usize) -> Result<f64, IoError> {
    let weight: f64 = field.parse().map_err(|_| IoError::MalformedText {
        line,
        reason: format!("invalid weight {field:?}"),
    })?;
    if !ring.is_member(&weight) {
        return Err(IoError::Model(FstError::CorruptModel(format!(
            "weight {weight} outside the semiring domain (line {line})"
        ))));
    }
    Ok(weight)
}

fn ensure_state<S: StdSemiring>(fst: &mut MutableFst<S>, id: StateId) {
    while fst.num_states() <= id as usize {
        fst.add_state();
    }
}
