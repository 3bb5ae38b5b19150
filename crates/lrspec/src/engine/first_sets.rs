//! Calculation of first set function.

use super::TerminalSet;
use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID},
    types::{Map, Set},
};

#[derive(Debug)]
pub(super) struct FirstSets {
    nulls: Set<NonterminalID>,
    first_sets: Map<NonterminalID, TerminalSet>,
}

impl FirstSets {
    pub fn new(g: &Grammar) -> Self {
        let nulls = nulls_set(g);
        let first_sets = first_sets(g, &nulls);
        Self { nulls, first_sets }
    }

    /// `First(symbols)`, and whether `symbols` derives the empty string.
    pub fn get(&self, symbols: &[SymbolID]) -> (TerminalSet, bool) {
        let mut res = TerminalSet::default();
        for symbol in symbols {
            match symbol {
                SymbolID::T(t) => {
                    res.insert(*t);
                    return (res, false);
                }
                SymbolID::N(n) => {
                    if let Some(first) = self.first_sets.get(n) {
                        res.union_with(first);
                    }
                    if !self.nulls.contains(n) {
                        return (res, false);
                    }
                }
            }
        }
        (res, true)
    }
}

/// Calculate the set of nullable symbols in this grammar.
fn nulls_set(g: &Grammar) -> Set<NonterminalID> {
    let mut nulls = Set::default();
    let mut changed = true;
    while changed {
        changed = false;
        for p in g.productions.values() {
            if nulls.contains(&p.left) {
                continue;
            }
            let is_rhs_nullable = p.right.iter().all(|s| match s {
                SymbolID::T(..) => false,
                SymbolID::N(n) => nulls.contains(n),
            });
            if is_rhs_nullable {
                changed = true;
                nulls.insert(p.left);
            }
        }
    }
    nulls
}

fn first_sets(g: &Grammar, nulls: &Set<NonterminalID>) -> Map<NonterminalID, TerminalSet> {
    let mut map: Map<NonterminalID, TerminalSet> = g
        .nonterminals
        .keys()
        .map(|n| (*n, TerminalSet::default()))
        .collect();

    // X -> Y1 Y2 ... Yn: First(X) includes First(Yi) up to the first
    // non-nullable Yk.
    let mut constraints: Vec<(NonterminalID, NonterminalID)> = vec![];
    for (id, p) in &g.productions {
        if *id == ProductionID::ACCEPT {
            continue;
        }
        for symbol in &p.right {
            match symbol {
                SymbolID::T(t) => {
                    if let Some(first) = map.get_mut(&p.left) {
                        first.insert(*t);
                    }
                    break;
                }
                SymbolID::N(n) => {
                    if *n != p.left {
                        constraints.push((p.left, *n));
                    }
                    if !nulls.contains(n) {
                        break;
                    }
                }
            }
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for (sup, sub) in &constraints {
            let subset = match map.get(sub) {
                Some(subset) => subset.clone(),
                None => continue,
            };
            if let Some(superset) = map.get_mut(sup) {
                let before = superset.len();
                superset.union_with(&subset);
                changed |= superset.len() != before;
            }
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{ProductionDecl, TerminalID};
    use SymbolID::*;

    #[test]
    fn nullable_prefix() {
        let g = Grammar::define(|g| {
            let a = g.token("T_A")?;
            let b = g.token("T_B")?;
            let s = g.nonterminal("S")?;
            let opt = g.nonterminal("Opt")?;
            g.production(s, ProductionDecl::new([N(opt), T(b)]))?;
            g.production(opt, ProductionDecl::new([]))?;
            g.production(opt, ProductionDecl::new([T(a)]))?;
            Ok(())
        })
        .unwrap();
        let first_sets = FirstSets::new(&g);

        let a = g.token_by_name("A").unwrap();
        let b = g.token_by_name("B").unwrap();
        let s = g.nonterminal_by_name("S").unwrap();
        let opt = g.nonterminal_by_name("Opt").unwrap();

        let (first, nullable) = first_sets.get(&[N(s)]);
        assert!(!nullable);
        assert_eq!(first.iter().collect::<Vec<_>>(), [a, b]);

        let (first, nullable) = first_sets.get(&[N(opt)]);
        assert!(nullable);
        assert_eq!(first.iter().collect::<Vec<_>>(), [a]);

        let (first, nullable) = first_sets.get(&[N(opt), T(TerminalID::EOI)]);
        assert!(!nullable);
        assert_eq!(first.iter().collect::<Vec<_>>(), [TerminalID::EOI, a]);

        let (first, nullable) = first_sets.get(&[]);
        assert!(nullable);
        assert_eq!(first.len(), 0);
    }
}
