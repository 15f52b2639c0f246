// Symbol table: bidirectional string <-> label-id mapping.
//
// Ids are assigned monotonically starting at 0 and are never reused while the
// table is live, so the forward and inverse maps stay a bijection. Index 0 is
// conventionally the epsilon symbol (see `EPSILON`).

use hashbrown::HashMap;

use crate::arc::{EPSILON, Label};
use crate::error::FstError;

/// The conventional string for the reserved epsilon label.
pub const EPSILON_SYMBOL: &str = "<eps>";

/// Bidirectional mapping from symbol strings to dense label ids.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    by_symbol: HashMap<String, Label>,
    by_id: Vec<String>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with `<eps>` pre-registered at index 0.
    pub fn with_epsilon() -> Self {
        let mut table = Self::new();
        let id = table.get_or_add(EPSILON_SYMBOL);
        debug_assert_eq!(id, EPSILON);
        table
    }

    /// Look up the symbol's id, inserting it with the next free id if absent.
    pub fn get_or_add(&mut self, symbol: &str) -> Label {
        if let Some(&id) = self.by_symbol.get(symbol) {
            return id;
        }
        let id = self.by_id.len() as Label;
        self.by_symbol.insert(symbol.to_string(), id);
        self.by_id.push(symbol.to_string());
        id
    }

    /// Look up the symbol's id.
    pub fn id(&self, symbol: &str) -> Option<Label> {
        self.by_symbol.get(symbol).copied()
    }

    /// Look up the symbol's id, erroring on a missing symbol.
    pub fn require_id(&self, symbol: &str) -> Result<Label, FstError> {
        self.id(symbol)
            .ok_or_else(|| FstError::UnknownSymbol(symbol.to_string()))
    }

    /// Look up the string for an id.
    pub fn symbol(&self, id: Label) -> Option<&str> {
        self.by_id.get(id as usize).map(String::as_str)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterate `(id, symbol)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (Label, &str)> {
        self.by_id
            .iter()
            .enumerate()
            .map(|(id, s)| (id as Label, s.as_str()))
    }

    /// True if the forward and inverse maps are still a bijection.
    pub fn is_bijective(&self) -> bool {
        self.by_symbol.len() == self.by_id.len()
            && self
                .by_id
                .iter()
                .enumerate()
                .all(|(id, s)| self.by_symbol.get(s) == Some(&(id as Label)))
    }
}

impl PartialEq for SymbolTable {
    fn eq(&self, other: &Self) -> bool {
        // The inverse map determines the forward map.
        self.by_id == other.by_id
    }
}

/// Read-only decorator over a [`SymbolTable`]. The mutating entry point
/// fails instead of inserting.
#[derive(Debug, Clone)]
pub struct FrozenSymbolTable {
    inner: SymbolTable,
}

impl FrozenSymbolTable {
    pub fn freeze(inner: SymbolTable) -> Self {
        Self { inner }
    }

    /// Always fails: frozen tables do not accept new symbols.
    pub fn get_or_add(&self, _symbol: &str) -> Result<Label, FstError> {
        Err(FstError::FrozenModification)
    }

    pub fn id(&self, symbol: &str) -> Option<Label> {
        self.inner.id(symbol)
    }

    pub fn symbol(&self, id: Label) -> Option<&str> {
        self.inner.symbol(id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Borrow the underlying table (still immutable through `&self`).
    pub fn as_table(&self) -> &SymbolTable {
        &self.inner
    }
}
