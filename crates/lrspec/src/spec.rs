//! Compiled LR automata.

use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID},
    types::Map,
    util::display_fn,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateID(u32);
impl StateID {
    pub const START: Self = Self(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn into_raw(self) -> u32 {
        self.0
    }
}
impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}
impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Shift(StateID),
    Reduce(ProductionID),
    Accept,
    /// An explicit syntax error, produced by nonassociative precedences.
    Fail,
    Inconsistent {
        shift: Option<StateID>,
        reduces: Vec<ProductionID>,
        reason: ConflictReason,
    },
}
impl Action {
    pub fn is_consistent(&self) -> bool {
        !matches!(self, Self::Inconsistent { .. })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ConflictReason {
    MultipleReductionWithoutShift,
    MissingPrecedence,
    InconsistentShiftResolution,
    /// Equal precedences declared with the `fail` associativity.
    FailingAssociativity,
    /// A reduction competes with accepting the input.
    AcceptConflict,
}

/// A kernel item of an LR(1) state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub production: ProductionID,
    pub index: u16,
    pub lookaheads: Vec<TerminalID>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecState {
    /// Empty for skinny builds.
    pub kernels: Vec<Item>,
    pub actions: Map<TerminalID, Action>,
    pub gotos: Map<NonterminalID, StateID>,
}

/// The states of an LR automaton, as produced by an engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Automaton {
    pub states: Map<StateID, SpecState>,
}

/// A grammar paired with the automaton compiled from it.
#[derive(Debug)]
pub struct CompiledSpec<'g> {
    grammar: &'g Grammar,
    automaton: Automaton,
}

impl<'g> CompiledSpec<'g> {
    pub fn new(grammar: &'g Grammar, automaton: Automaton) -> Self {
        Self { grammar, automaton }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn into_automaton(self) -> Automaton {
        self.automaton
    }

    pub fn states(&self) -> impl Iterator<Item = (StateID, &SpecState)> + '_ {
        self.automaton.states.iter().map(|(id, s)| (*id, s))
    }

    /// Whether every (state, lookahead) pair has at most one action.
    pub fn is_pure_lr(&self) -> bool {
        self.conflicts().next().is_none()
    }

    pub fn conflicts(&self) -> impl Iterator<Item = (StateID, TerminalID, &Action)> + '_ {
        self.states().flat_map(|(id, state)| {
            state
                .actions
                .iter()
                .filter(|(_, action)| !action.is_consistent())
                .map(move |(t, action)| (id, *t, action))
        })
    }

    /// Render the automaton in a human-readable form.
    pub fn display(&self) -> impl fmt::Display + '_ {
        let g = self.grammar;
        display_fn(move |f| {
            for (id, state) in self.states() {
                writeln!(f, "#### State {:?}", id)?;
                writeln!(f, "## kernels")?;
                for item in &state.kernels {
                    let production = g.production(item.production);
                    write!(f, "- [{} -> ", g.nonterminals[&production.left].name)?;
                    for (i, symbol) in production.right.iter().enumerate() {
                        if i > 0 {
                            f.write_str(" ")?;
                        }
                        if i == item.index as usize {
                            f.write_str(". ")?;
                        }
                        f.write_str(g.symbol_name(*symbol))?;
                    }
                    if item.index as usize == production.right.len() {
                        f.write_str(" .")?;
                    }
                    f.write_str("] {")?;
                    for (i, t) in item.lookaheads.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        f.write_str(&g.terminals[t].name)?;
                    }
                    writeln!(f, "}}")?;
                }
                writeln!(f, "## actions")?;
                for (t, action) in &state.actions {
                    let t = &g.terminals[t].name;
                    match action {
                        Action::Shift(n) => writeln!(f, "- {} => shift({:?})", t, n)?,
                        Action::Reduce(p) => writeln!(
                            f,
                            "- {} => reduce({})",
                            t,
                            g.production(*p).display(g)
                        )?,
                        Action::Accept => writeln!(f, "- {} => accept", t)?,
                        Action::Fail => writeln!(f, "- {} => fail", t)?,
                        Action::Inconsistent {
                            shift,
                            reduces,
                            reason,
                        } => {
                            writeln!(f, "- {} => inconsistent({:?})", t, reason)?;
                            if let Some(n) = shift {
                                writeln!(f, "  - shift({:?})", n)?;
                            }
                            for p in reduces {
                                if *p == ProductionID::ACCEPT {
                                    writeln!(f, "  - accept")?;
                                } else {
                                    writeln!(f, "  - reduce({})", g.production(*p).display(g))?;
                                }
                            }
                        }
                    }
                }
                writeln!(f, "## gotos")?;
                for (n, next) in &state.gotos {
                    writeln!(
                        f,
                        "- {} => goto({:?})",
                        g.symbol_name(SymbolID::N(*n)),
                        next
                    )?;
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }
}
