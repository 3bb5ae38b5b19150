//! Canonical LR(1) automaton in the sense of Knuth.

use super::{first_sets::FirstSets, resolve::resolve_conflict, TerminalSet};
use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID},
    spec::{Action, Automaton, Item, SpecState, StateID},
    types::Map,
};
use std::collections::VecDeque;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct LR0Item {
    production: ProductionID,
    index: u16,
}

/// LR(1) items, with the lookaheads merged per LR(0) core.
type ItemSet = Map<LR0Item, TerminalSet>;

/// The canonical key of a kernel, independent of insertion order.
type KernelKey = Vec<(LR0Item, Vec<TerminalID>)>;

fn kernel_key(kernel: &ItemSet) -> KernelKey {
    let mut key: KernelKey = kernel
        .iter()
        .map(|(core, lookaheads)| (*core, lookaheads.iter().collect()))
        .collect();
    key.sort();
    key
}

struct Builder<'g> {
    g: &'g Grammar,
    first_sets: FirstSets,
    productions_by_left: Map<NonterminalID, Vec<ProductionID>>,
}

impl Builder<'_> {
    fn closure(&self, items: &mut ItemSet) {
        let mut changed = true;
        while changed {
            changed = false;

            let mut added: Vec<(LR0Item, TerminalSet)> = vec![];
            for (core, lookaheads) in items.iter() {
                let production = self.g.production(core.production);
                let (n, beta) = match &production.right[core.index as usize..] {
                    [SymbolID::N(n), beta @ ..] => (*n, beta),
                    _ => continue,
                };
                let (mut follow, nullable) = self.first_sets.get(beta);
                if nullable {
                    follow.union_with(lookaheads);
                }
                for &production in self.productions_by_left.get(&n).into_iter().flatten() {
                    added.push((
                        LR0Item {
                            production,
                            index: 0,
                        },
                        follow.clone(),
                    ));
                }
            }

            for (core, lookaheads) in added {
                let slot = items.entry(core).or_insert_with(|| {
                    changed = true;
                    TerminalSet::default()
                });
                let before = slot.len();
                slot.union_with(&lookaheads);
                changed |= slot.len() != before;
            }
        }
    }
}

pub(super) fn build(g: &Grammar, skinny: bool) -> Automaton {
    let _entered = tracing::trace_span!("canonical_lr1").entered();

    let mut productions_by_left: Map<NonterminalID, Vec<ProductionID>> = Map::default();
    for (&id, p) in &g.productions {
        productions_by_left.entry(p.left).or_default().push(id);
    }
    let builder = Builder {
        g,
        first_sets: FirstSets::new(g),
        productions_by_left,
    };

    let mut states: Map<StateID, SpecState> = Map::default();
    let mut kernels: Map<KernelKey, StateID> = Map::default();
    let mut pending: VecDeque<(StateID, ItemSet)> = VecDeque::new();

    let mut start = ItemSet::default();
    start.insert(
        LR0Item {
            production: ProductionID::ACCEPT,
            index: 0,
        },
        TerminalSet::default(),
    );
    kernels.insert(kernel_key(&start), StateID::START);
    pending.push_back((StateID::START, start));
    let mut next_state_id = 1;

    while let Some((current, kernel)) = pending.pop_front() {
        let mut items = kernel.clone();
        builder.closure(&mut items);

        let mut transitions: Map<SymbolID, ItemSet> = Map::default();
        let mut pending_actions: Map<TerminalID, (Option<StateID>, Vec<ProductionID>)> =
            Map::default();
        for (core, lookaheads) in &items {
            let production = g.production(core.production);
            match production.right.get(core.index as usize) {
                Some(symbol) => {
                    let next = LR0Item {
                        production: core.production,
                        index: core.index + 1,
                    };
                    transitions
                        .entry(*symbol)
                        .or_default()
                        .entry(next)
                        .or_default()
                        .union_with(lookaheads);
                }
                None => {
                    for t in lookaheads.iter() {
                        pending_actions.entry(t).or_default().1.push(core.production);
                    }
                }
            }
        }

        let mut gotos = Map::default();
        for (symbol, next_kernel) in transitions {
            if symbol == SymbolID::T(TerminalID::EOI) {
                // Only the accepting item reads the end of input.
                pending_actions
                    .entry(TerminalID::EOI)
                    .or_default()
                    .1
                    .push(ProductionID::ACCEPT);
                continue;
            }

            let key = kernel_key(&next_kernel);
            let next = match kernels.get(&key) {
                Some(next) => *next,
                None => {
                    let next = StateID::from_raw(next_state_id);
                    next_state_id += 1;
                    kernels.insert(key, next);
                    pending.push_back((next, next_kernel));
                    next
                }
            };
            match symbol {
                SymbolID::T(t) => pending_actions.entry(t).or_default().0 = Some(next),
                SymbolID::N(n) => {
                    gotos.insert(n, next);
                }
            }
        }

        let mut actions = Map::default();
        for (t, (shift, reduces)) in pending_actions {
            let action = resolve_conflict(g, t, shift, &reduces);
            if !action.is_consistent() {
                tracing::debug!(
                    "unresolved conflict in {:?} on `{}': {:?}",
                    current,
                    g.terminals[&t].name,
                    action
                );
            }
            actions.insert(t, action);
        }

        let kernel_items = if skinny {
            vec![]
        } else {
            kernel
                .iter()
                .map(|(core, lookaheads)| Item {
                    production: core.production,
                    index: core.index,
                    lookaheads: lookaheads.iter().collect(),
                })
                .collect()
        };

        states.insert(
            current,
            SpecState {
                kernels: kernel_items,
                actions,
                gotos,
            },
        );
    }

    tracing::trace!("canonical LR(1) automaton: {} states", states.len());
    Automaton { states }
}
