// WFB binary model format.
//
// Layout (all integers little-endian):
//   bytes 0..4    cookie1
//   bytes 4..8    cookie2
//   byte  8       format version
//   byte  9       semiring tag (see `SemiringKind`)
//   bytes 10..16  reserved, zero
//   bytes 16..32  counts: num_states, start, isyms byte length, osyms byte
//                 length (u32 each)
//   then          input symbols, NUL-terminated strings in id order
//   then          output symbols, same encoding
//   then          zero padding to an 8-byte file offset
//   then          one 16-byte `StateRecord` per state
//   then          one 24-byte `ArcRecord` per arc, grouped by source state
//
// The loader re-validates every model invariant (arc targets in range,
// weights in the ring's domain) so a corrupt file is rejected instead of
// producing a broken transducer. Labels are plain ids: the symbol tables
// are carried for display and need not cover every arc label, exactly as
// in the mutable model.

use std::path::Path;

use bytemuck::{Pod, Zeroable};

use weft_core::arc::{NO_STATE, StateId};
use weft_core::error::FstError;
use weft_core::fst::{FstView, MutableFst};
use weft_core::semiring::{Semiring, SemiringKind, StdSemiring};
use weft_core::symbols::SymbolTable;

use crate::{IoError, write_atomic};

const COOKIE1: u32 = 0x0057_4642;
const COOKIE2: u32 = 0x0177_6674;

/// Size of the fixed header in bytes, counts excluded.
pub const HEADER_SIZE: usize = 16;
const COUNTS_SIZE: usize = 16;

/// Current format version.
pub const FORMAT_VERSION: u8 = 1;

/// Per-state record: final weight plus the length of the state's slice of
/// the arc array.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct StateRecord {
    final_weight: f64,
    arc_count: u32,
    _pad: u32,
}

/// Per-arc record. Targets are state ids; labels index the symbol tables.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ArcRecord {
    weight: f64,
    ilabel: u32,
    olabel: u32,
    next_state: u32,
    _pad: u32,
}

const _: () = assert!(size_of::<StateRecord>() == 16);
const _: () = assert!(size_of::<ArcRecord>() == 24);

fn kind_tag(kind: SemiringKind) -> u8 {
    match kind {
        SemiringKind::Tropical => 0,
        SemiringKind::Log => 1,
        SemiringKind::Probability => 2,
    }
}

fn tag_kind(tag: u8) -> Result<SemiringKind, IoError> {
    match tag {
        0 => Ok(SemiringKind::Tropical),
        1 => Ok(SemiringKind::Log),
        2 => Ok(SemiringKind::Probability),
        other => Err(IoError::UnknownSemiring(other)),
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Serialize a transducer to the WFB byte layout.
pub fn to_bytes<S: StdSemiring>(fst: &MutableFst<S>) -> Vec<u8> {
    let isyms = encode_symbols(fst.input_symbols());
    let osyms = encode_symbols(fst.output_symbols());

    let mut buf = Vec::new();
    buf.extend_from_slice(&COOKIE1.to_le_bytes());
    buf.extend_from_slice(&COOKIE2.to_le_bytes());
    buf.push(FORMAT_VERSION);
    buf.push(kind_tag(S::KIND));
    buf.extend_from_slice(&[0u8; 6]);

    buf.extend_from_slice(&(fst.num_states() as u32).to_le_bytes());
    buf.extend_from_slice(&fst.start().unwrap_or(NO_STATE).to_le_bytes());
    buf.extend_from_slice(&(isyms.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(osyms.len() as u32).to_le_bytes());

    buf.extend_from_slice(&isyms);
    buf.extend_from_slice(&osyms);
    while buf.len() % 8 != 0 {
        buf.push(0);
    }

    for s in 0..fst.num_states() as StateId {
        let record = StateRecord {
            final_weight: *fst.final_weight(s),
            arc_count: fst.arcs(s).len() as u32,
            _pad: 0,
        };
        buf.extend_from_slice(bytemuck::bytes_of(&record));
    }
    for s in 0..fst.num_states() as StateId {
        for arc in fst.arcs(s) {
            let record = ArcRecord {
                weight: arc.weight,
                ilabel: arc.ilabel,
                olabel: arc.olabel,
                next_state: arc.next_state,
                _pad: 0,
            };
            buf.extend_from_slice(bytemuck::bytes_of(&record));
        }
    }
    buf
}

/// Serialize to `path` via a temp file and atomic rename.
pub fn write_file<S: StdSemiring>(path: &Path, fst: &MutableFst<S>) -> Result<(), IoError> {
    write_atomic(path, &to_bytes(fst))
}

fn encode_symbols(table: &SymbolTable) -> Vec<u8> {
    let mut out = Vec::new();
    for (_, symbol) in table.iter() {
        out.extend_from_slice(symbol.as_bytes());
        out.push(0);
    }
    out
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Deserialize a transducer, checking the header against the requested
/// ring `S` and re-validating the model invariants.
pub fn from_bytes<S: StdSemiring>(data: &[u8]) -> Result<MutableFst<S>, IoError> {
    let fixed = HEADER_SIZE + COUNTS_SIZE;
    if data.len() < fixed {
        return Err(IoError::TooShort {
            expected: fixed,
            actual: data.len(),
        });
    }
    let cookie1 = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let cookie2 = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if cookie1 != COOKIE1 || cookie2 != COOKIE2 {
        return Err(IoError::InvalidMagic);
    }
    if data[8] != FORMAT_VERSION {
        return Err(IoError::UnsupportedVersion(data[8]));
    }
    let kind = tag_kind(data[9])?;
    if kind != S::KIND {
        return Err(IoError::SemiringMismatch {
            found: kind.name(),
            requested: S::KIND.name(),
        });
    }

    let num_states = read_u32(data, 16) as usize;
    let start = read_u32(data, 20);
    let isyms_len = read_u32(data, 24) as usize;
    let osyms_len = read_u32(data, 28) as usize;

    let syms_end = fixed + isyms_len + osyms_len;
    let records_start = syms_end.div_ceil(8) * 8;
    if data.len() < records_start {
        return Err(IoError::TooShort {
            expected: records_start,
            actual: data.len(),
        });
    }
    let isyms = decode_symbols(&data[fixed..fixed + isyms_len])?;
    let osyms = decode_symbols(&data[fixed + isyms_len..syms_end])?;

    let states_end = records_start + num_states * size_of::<StateRecord>();
    if data.len() < states_end {
        return Err(IoError::TooShort {
            expected: states_end,
            actual: data.len(),
        });
    }
    let states: &[StateRecord] = bytemuck::try_cast_slice(&data[records_start..states_end])
        .map_err(|_| IoError::Alignment)?;

    let total_arcs: usize = states.iter().map(|r| r.arc_count as usize).sum();
    let arcs_end = states_end + total_arcs * size_of::<ArcRecord>();
    if data.len() < arcs_end {
        return Err(IoError::TooShort {
            expected: arcs_end,
            actual: data.len(),
        });
    }
    let arcs: &[ArcRecord] =
        bytemuck::try_cast_slice(&data[states_end..arcs_end]).map_err(|_| IoError::Alignment)?;

    // Two-phase build: allocate every state, then wire arcs, so forward
    // references resolve.
    let ring = S::default();
    let mut fst = MutableFst::new(ring.clone());
    fst.set_input_symbols(isyms);
    fst.set_output_symbols(osyms);
    for record in states {
        let id = fst.add_state();
        if !ring.is_member(&record.final_weight) {
            return Err(FstError::CorruptModel(format!(
                "state {id}: final weight {} outside the {} domain",
                record.final_weight,
                kind.name()
            ))
            .into());
        }
        fst.set_final(id, record.final_weight)?;
    }

    let mut cursor = 0usize;
    for (s, record) in states.iter().enumerate() {
        for arc in &arcs[cursor..cursor + record.arc_count as usize] {
            if !ring.is_member(&arc.weight) {
                return Err(FstError::CorruptModel(format!(
                    "state {s}: arc weight {} outside the {} domain",
                    arc.weight,
                    kind.name()
                ))
                .into());
            }
            // add_arc validates next_state against the allocated states.
            fst.add_arc(s as StateId, arc.ilabel, arc.olabel, arc.weight, arc.next_state)
                .map_err(|_| {
                    IoError::Model(FstError::CorruptModel(format!(
                        "state {s}: arc target {} out of range",
                        arc.next_state
                    )))
                })?;
        }
        cursor += record.arc_count as usize;
    }

    if start != NO_STATE {
        fst.set_start(start).map_err(|_| {
            IoError::Model(FstError::CorruptModel(format!(
                "start state {start} out of range"
            )))
        })?;
    }
    Ok(fst)
}

/// Deserialize from a file on disk.
pub fn read_file<S: StdSemiring>(path: &Path) -> Result<MutableFst<S>, IoError> {
    let data = std::fs::read(path)?;
    from_bytes(&data)
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn decode_symbols(block: &[u8]) -> Result<SymbolTable, IoError> {
    let mut table = SymbolTable::new();
    if block.is_empty() {
        return Ok(table);
    }
    let Some(stripped) = block.strip_suffix(&[0]) else {
        return Err(FstError::CorruptModel(
            "symbol block is not NUL-terminated".to_string(),
        )
        .into());
    };
    for raw in stripped.split(|&b| b == 0) {
        let symbol = std::str::from_utf8(raw).map_err(|_| {
            IoError::Model(FstError::CorruptModel(
                "symbol is not valid UTF-8".to_string(),
            ))
        })?;
        let before = table.len();
        table.get_or_add(symbol);
        if table.len() == before {
            return Err(FstError::CorruptModel(format!(
                "duplicate symbol {symbol:?} in table"
            ))
            .into());
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::fst::fst_approx_eq;
    use weft_core::semiring::{LogSemiring, TropicalSemiring};

    fn sample() -> MutableFst<TropicalSemiring> {
        let mut fst = MutableFst::new(TropicalSemiring);
        fst.input_symbols_mut().get_or_add("a");
        fst.input_symbols_mut().get_or_add("b");
        fst.output_symbols_mut().get_or_add("x");
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        let s2 = fst.add_state();
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, 1, 1, 0.5, s1).unwrap();
        fst.add_arc(s0, 2, 0, 1.5, s2).unwrap();
        fst.add_arc(s1, 1, 1, 2.5, s2).unwrap();
        fst.set_final(s2, 3.5).unwrap();
        fst
    }

    #[test]
    fn round_trip_preserves_everything() {
        let fst = sample();
        let bytes = to_bytes(&fst);
        let back: MutableFst<TropicalSemiring> = from_bytes(&bytes).unwrap();
        assert!(fst_approx_eq(&fst, &back));
        assert_eq!(fst.input_symbols(), back.input_symbols());
        assert_eq!(fst.output_symbols(), back.output_symbols());
    }

    #[test]
    fn empty_transducer_round_trips() {
        let fst: MutableFst<TropicalSemiring> = MutableFst::new(TropicalSemiring);
        let back: MutableFst<TropicalSemiring> = from_bytes(&to_bytes(&fst)).unwrap();
        assert_eq!(back.num_states(), 0);
        assert_eq!(back.start(), None);
    }

    #[test]
    fn labels_without_symbol_entries_round_trip() {
        // Labels are not required to be registered in the tables; the
        // writer and loader must agree on that.
        let mut fst = MutableFst::new(TropicalSemiring);
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, 7, 9, 1.0, s1).unwrap();
        fst.set_final(s1, 0.0).unwrap();

        let back: MutableFst<TropicalSemiring> = from_bytes(&to_bytes(&fst)).unwrap();
        assert!(fst_approx_eq(&fst, &back));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = to_bytes(&sample());
        bytes[0] ^= 0xFF;
        assert!(matches!(
            from_bytes::<TropicalSemiring>(&bytes).unwrap_err(),
            IoError::InvalidMagic
        ));
    }

    #[test]
    fn future_version_is_rejected() {
        let mut bytes = to_bytes(&sample());
        bytes[8] = FORMAT_VERSION + 1;
        assert!(matches!(
            from_bytes::<TropicalSemiring>(&bytes).unwrap_err(),
            IoError::UnsupportedVersion(_)
        ));
    }

    #[test]
    fn semiring_mismatch_is_rejected() {
        let bytes = to_bytes(&sample());
        let err = from_bytes::<LogSemiring>(&bytes).unwrap_err();
        assert!(matches!(
            err,
            IoError::SemiringMismatch {
                found: "tropical",
                requested: "log"
            }
        ));
    }

    #[test]
    fn truncated_input_is_rejected() {
        let bytes = to_bytes(&sample());
        let err = from_bytes::<TropicalSemiring>(&bytes[..bytes.len() - 8]).unwrap_err();
        assert!(matches!(err, IoError::TooShort { .. }));
    }

    #[test]
    fn out_of_range_arc_target_is_rejected() {
        let mut bytes = to_bytes(&sample());
        // Corrupt the last arc record's next_state field.
        let target_offset = bytes.len() - 8;
        bytes[target_offset..target_offset + 4].copy_from_slice(&99u32.to_le_bytes());
        let err = from_bytes::<TropicalSemiring>(&bytes).unwrap_err();
        assert!(matches!(err, IoError::Model(FstError::CorruptModel(_))));
    }

    #[test]
    fn file_round_trip_is_atomic_and_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.wfb");
        let fst = sample();
        write_file(&path, &fst).unwrap();
        let back: MutableFst<TropicalSemiring> = read_file(&path).unwrap();
        assert!(fst_approx_eq(&fst, &back));
    }
}
