//! Export of compiled specs into the table format consumed by parser runtimes.
//!
//! The exported table is deterministic: productions are numbered by sorting on
//! their qualified names, the actions of each state are ordered by lookahead
//! name and the gotos by nonterminal name, so that neither the engine nor the
//! hash maps leak their iteration order into the output.

use crate::{
    grammar::{ProductionID, SymbolID},
    spec::{Action, CompiledSpec},
    types::{Map, Set},
};
use serde::{Deserialize, Serialize};

/// The name of the end-of-input lookahead in exported tables.
pub const EOI_NAME: &str = "<$>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedTable {
    /// Per state, `(lookahead name, action)` pairs sorted by lookahead name.
    pub actions: Vec<Vec<(String, ExportAction)>>,
    /// Per state, `(nonterminal name, next state)` pairs sorted by name.
    pub goto: Vec<Vec<(String, usize)>>,
    pub start: String,
    /// `(production id, inline index)`
    pub inlines: Vec<(usize, usize)>,
    /// `(class name, production name)`, indexed by production id.
    pub production_names: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportAction {
    Shift(usize),
    Reduce(ExportReduce),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReduce {
    pub production_id: usize,
    pub non_term: String,
    /// The number of right-hand symbols.
    pub cnt: usize,
}

/// Export a compiled spec.
///
/// # Panics
///
/// Panics if the spec has an unresolved conflict, or if its states are not
/// numbered contiguously from zero.
pub fn export(spec: &CompiledSpec<'_>) -> ExportedTable {
    assert!(
        spec.is_pure_lr(),
        "cannot export a spec that has unresolved conflicts"
    );
    let g = spec.grammar();

    let mut states: Vec<_> = spec.states().collect();
    states.sort_by_key(|(id, _)| *id);
    for (i, (id, _)) in states.iter().enumerate() {
        assert_eq!(id.into_raw() as usize, i, "state IDs must be contiguous");
    }

    let mut productions: Vec<ProductionID> = states
        .iter()
        .flat_map(|(_, state)| state.actions.values())
        .filter_map(|action| match action {
            Action::Reduce(p) => Some(*p),
            _ => None,
        })
        .collect::<Set<_>>()
        .into_iter()
        .collect();
    productions.sort_by(|a, b| {
        let a = g.production(*a).qualified_name(g);
        let b = g.production(*b).qualified_name(g);
        Ord::cmp(&a, &b)
    });
    let production_ids: Map<ProductionID, usize> = productions
        .iter()
        .enumerate()
        .map(|(i, p)| (*p, i))
        .collect();

    let mut actions = Vec::with_capacity(states.len());
    let mut goto = Vec::with_capacity(states.len());
    for (_, state) in &states {
        let mut row: Vec<(String, ExportAction)> = state
            .actions
            .iter()
            .filter_map(|(t, action)| {
                let action = match action {
                    Action::Shift(next) => ExportAction::Shift(next.into_raw() as usize),
                    Action::Reduce(p) => {
                        let production = g.production(*p);
                        ExportAction::Reduce(ExportReduce {
                            production_id: production_ids[p],
                            non_term: g.symbol_name(SymbolID::N(production.left)).to_owned(),
                            cnt: production.right.len(),
                        })
                    }
                    Action::Accept | Action::Fail | Action::Inconsistent { .. } => return None,
                };
                Some((g.terminals[t].lex_name.clone(), action))
            })
            .collect();
        row.sort_by(|(a, _), (b, _)| a.cmp(b));
        actions.push(row);

        let mut row: Vec<(String, usize)> = state
            .gotos
            .iter()
            .map(|(n, next)| {
                (
                    g.symbol_name(SymbolID::N(*n)).to_owned(),
                    next.into_raw() as usize,
                )
            })
            .collect();
        row.sort();
        goto.push(row);
    }

    let inlines = productions
        .iter()
        .enumerate()
        .filter_map(|(i, p)| g.production(*p).inline.map(|index| (i, index)))
        .collect();

    let production_names = productions
        .iter()
        .map(|p| {
            let (class_name, name) = g.production(*p).qualified_name(g);
            (class_name.to_owned(), name.to_owned())
        })
        .collect();

    ExportedTable {
        actions,
        goto,
        start: g.symbol_name(SymbolID::N(g.start_symbol)).to_owned(),
        inlines,
        production_names,
    }
}

impl ExportedTable {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Look up the action of a state on the lookahead.
    pub fn action(&self, state: usize, lookahead: &str) -> Option<&ExportAction> {
        let row = self.actions.get(state)?;
        row.binary_search_by(|(name, _)| name.as_str().cmp(lookahead))
            .ok()
            .map(|i| &row[i].1)
    }

    pub fn goto(&self, state: usize, non_term: &str) -> Option<usize> {
        let row = self.goto.get(state)?;
        row.binary_search_by(|(name, _)| name.as_str().cmp(non_term))
            .ok()
            .map(|i| row[i].1)
    }

    pub fn inline_index(&self, production_id: usize) -> Option<usize> {
        self.inlines
            .iter()
            .find(|(id, _)| *id == production_id)
            .map(|(_, index)| *index)
    }
}
