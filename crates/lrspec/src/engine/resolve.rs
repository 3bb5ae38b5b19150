//! Conflict resolution based on precedence and associativity.

use crate::{
    grammar::{Grammar, ProductionID, TerminalID},
    precedence::{Assoc, PrecedenceID},
    spec::{Action, ConflictReason, StateID},
};
use std::cmp::Ordering;

/// Determine the action on `symbol` from the candidate shift and reductions.
///
/// `reduces` must not be empty when `shift` is `None`.
pub(super) fn resolve_conflict(
    g: &Grammar,
    symbol: TerminalID,
    shift: Option<StateID>,
    reduces: &[ProductionID],
) -> Action {
    use Action::*;

    let inconsistent = |reason| Inconsistent {
        shift,
        reduces: reduces.to_owned(),
        reason,
    };

    match (shift, reduces) {
        (Some(next), []) => Shift(next),
        (None, [ProductionID::ACCEPT]) => Accept,
        (None, [reduce]) => Reduce(*reduce),
        (None, []) => unreachable!("no candidate actions on {:?}", symbol),

        _ if reduces.contains(&ProductionID::ACCEPT) => {
            inconsistent(ConflictReason::AcceptConflict)
        }

        (Some(next), reduces) => {
            let shift_prec = g.terminals[&symbol].precedence;

            let mut resolved = None;
            for reduce in reduces {
                let reduce_prec = g.production(*reduce).precedence(g);
                let diff = match compare_precs(g, shift_prec, reduce_prec) {
                    Ok(diff) => diff,
                    Err(reason) => return inconsistent(reason),
                };
                match (resolved, diff) {
                    (None, diff) => resolved = Some(diff),
                    (Some(PrecDiff::Left), PrecDiff::Left)
                    | (Some(PrecDiff::Neither), PrecDiff::Neither) => (),
                    _ => return inconsistent(ConflictReason::InconsistentShiftResolution),
                }
            }

            match (resolved, reduces) {
                (Some(PrecDiff::Left), _) => Shift(next),
                (Some(PrecDiff::Neither), _) => Fail,
                (Some(PrecDiff::Right), [reduce]) => Reduce(*reduce),
                _ => inconsistent(ConflictReason::InconsistentShiftResolution),
            }
        }

        (None, _) => inconsistent(ConflictReason::MultipleReductionWithoutShift),
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum PrecDiff {
    /// Prefer the shift.
    Left,
    /// Prefer the reduction.
    Right,
    /// Reject the lookahead.
    Neither,
}

fn compare_precs(
    g: &Grammar,
    shift_prec: Option<PrecedenceID>,
    reduce_prec: Option<PrecedenceID>,
) -> Result<PrecDiff, ConflictReason> {
    let (p1, p2) = match (shift_prec, reduce_prec) {
        (Some(p1), Some(p2)) => (p1, p2),
        _ => return Err(ConflictReason::MissingPrecedence),
    };
    match g.precedences.compare(p1, p2) {
        Some(Ordering::Greater) => Ok(PrecDiff::Left),
        Some(Ordering::Less) => Ok(PrecDiff::Right),
        Some(Ordering::Equal) => match g.precedences.get(p1).assoc {
            Assoc::Left => Ok(PrecDiff::Right),
            Assoc::Right => Ok(PrecDiff::Left),
            Assoc::Nonassoc => Ok(PrecDiff::Neither),
            Assoc::Fail => Err(ConflictReason::FailingAssociativity),
        },
        None => Err(ConflictReason::MissingPrecedence),
    }
}
