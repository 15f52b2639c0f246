// Projection: collapse a transducer onto one label side, turning it into
// an acceptor (identical input and output labels on every arc).

use weft_core::arc::StateId;
use weft_core::fst::{FstView, MutableFst};
use weft_core::semiring::Semiring;

/// Which side survives the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectType {
    Input,
    Output,
}

/// Project in place: copy the chosen side's label onto the other side of
/// every arc, and align the symbol tables to match.
pub fn project<S: Semiring>(fst: &mut MutableFst<S>, ptype: ProjectType) {
    for s in 0..fst.num_states() as StateId {
        for arc in fst.arcs_mut(s) {
            match ptype {
                ProjectType::Input => arc.olabel = arc.ilabel,
                ProjectType::Output => arc.ilabel = arc.olabel,
            }
        }
    }
    match ptype {
        ProjectType::Input => {
            let table = fst.input_symbols().clone();
            fst.set_output_symbols(table);
        }
        ProjectType::Output => {
            let table = fst.output_symbols().clone();
            fst.set_input_symbols(table);
        }
    }
}
