//! LR automaton construction engines.

mod first_sets;
mod lr1;
mod resolve;

use crate::{grammar::Grammar, grammar::TerminalID, spec::Automaton};

/// An algorithm that builds the LR automaton of a grammar.
///
/// The name and version of an engine are part of the cache fingerprint, so an
/// engine must bump its version whenever its output for a given grammar may change.
pub trait Engine {
    fn name(&self) -> &str;

    fn version(&self) -> u32;

    /// Build the automaton. Kernel items are omitted when `skinny` is set.
    fn build(&self, g: &Grammar, skinny: bool) -> Automaton;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn version(&self) -> u32 {
        (**self).version()
    }

    fn build(&self, g: &Grammar, skinny: bool) -> Automaton {
        (**self).build(g, skinny)
    }
}

/// The canonical LR(1) construction, with shift/reduce conflicts resolved by
/// the declared precedences.
#[derive(Debug, Default, Copy, Clone)]
pub struct CanonicalLR1;

impl Engine for CanonicalLR1 {
    fn name(&self) -> &str {
        "canonical-lr1"
    }

    fn version(&self) -> u32 {
        1
    }

    fn build(&self, g: &Grammar, skinny: bool) -> Automaton {
        lr1::build(g, skinny)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.into_raw().into())
    }
    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner
            .iter()
            .filter_map(|raw| u16::try_from(raw).ok().map(TerminalID::from_raw))
    }
}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.into_raw().into()).collect(),
        }
    }
}
