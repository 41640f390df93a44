// MplsCheck: Verifying MPLS Reachability Under Bounded Link Failures
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Top-of-stack reduction of a PDA before solving.
//!
//! The reduction levels select progressively stronger answer-preserving prunings:
//!
//! - `0`: none
//! - `1`: top-of-stack symbol reachability, plus duplicate-rule removal
//! - `2`: reachability of the top *two* stack symbols, plus duplicate-rule removal
//! - `3`, `4`: like `1` and `2`, but keeping duplicate rules so that every surviving rule stays
//!   available for witness reconstruction
//!
//! A rule is removed when its premise can never hold under the abstraction (forward pass), or
//! when its target state cannot reach any accepting state (backward pass). Both prunings keep
//! the language of reachable accepting configurations intact.

use super::pds::{Pda, RuleOp, Weight};
use crate::error::UsageError;
use crate::query::Nfa;
use std::collections::{HashMap, HashSet, VecDeque};

/// Reduces the PDA in place. `initial` is the regular constraint on the initial stacks, used to
/// seed the abstraction. Returns `(rules_kept, rules_removed)`.
pub fn reduce<W: Weight>(
    pda: &mut Pda<W>,
    level: usize,
    initial: &Nfa,
) -> Result<(usize, usize), UsageError> {
    if level > 4 {
        return Err(UsageError::BadReduction(level));
    }
    let before = pda.rules().len();
    match level {
        0 => {}
        1 | 3 => prune(pda, &simple_enabled(pda, initial)),
        2 | 4 => prune(pda, &dual_enabled(pda, initial)),
        _ => unreachable!(),
    }
    if level == 1 || level == 2 {
        dedup(pda);
    }
    let after = pda.rules().len();
    Ok((after, before - after))
}

/// Forward abstraction tracking the set of possible top-of-stack symbols per state.
fn simple_enabled<W: Weight>(pda: &Pda<W>, initial: &Nfa) -> Vec<bool> {
    let n = pda.num_states();
    let mut tops: Vec<HashSet<usize>> = vec![HashSet::new(); n];
    let mut any = vec![false; n];
    let mut worklist: VecDeque<usize> = VecDeque::new();
    for &p in &pda.initial {
        for (guard, _) in initial.closed_initial_edges() {
            for sym in pda.matching_symbols(guard) {
                tops[p].insert(sym);
            }
        }
        worklist.push_back(p);
    }
    while let Some(s) = worklist.pop_front() {
        for &rid in pda.rules_from(s) {
            let rule = pda.rule(rid);
            if !(any[s] || tops[s].contains(&rule.label)) {
                continue;
            }
            let changed = match rule.op {
                RuleOp::Swap(l) | RuleOp::Push(l) => !any[rule.to] && tops[rule.to].insert(l),
                RuleOp::Noop => !any[rule.to] && tops[rule.to].insert(rule.label),
                RuleOp::Pop => {
                    let was = any[rule.to];
                    any[rule.to] = true;
                    !was
                }
            };
            if changed {
                worklist.push_back(rule.to);
            }
        }
    }
    pda.rules()
        .iter()
        .map(|r| any[r.from] || tops[r.from].contains(&r.label))
        .collect()
}

/// What the abstraction knows about the symbol *below* the top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Under {
    /// a concrete symbol
    Label(usize),
    /// unknown
    Any,
    /// the top is the last symbol of the stack
    Bottom,
}

/// Forward abstraction tracking pairs of the top two stack symbols. Refines the simple
/// abstraction at pop rules, where the revealed symbol is known.
fn dual_enabled<W: Weight>(pda: &Pda<W>, initial: &Nfa) -> Vec<bool> {
    let n = pda.num_states();
    let mut pairs: Vec<HashSet<(usize, Under)>> = vec![HashSet::new(); n];
    let mut any = vec![false; n];
    let mut worklist: VecDeque<usize> = VecDeque::new();
    for &p in &pda.initial {
        for (g1, t1) in initial.closed_initial_edges() {
            for l1 in pda.matching_symbols(g1) {
                if initial.closure_accepting(t1) {
                    pairs[p].insert((l1, Under::Bottom));
                }
                for (g2, _) in initial.closed_edges(t1) {
                    for l2 in pda.matching_symbols(g2) {
                        pairs[p].insert((l1, Under::Label(l2)));
                    }
                }
            }
        }
        worklist.push_back(p);
    }
    while let Some(s) = worklist.pop_front() {
        for &rid in pda.rules_from(s) {
            let rule = pda.rule(rid);
            let matched: Vec<Under> = if any[s] {
                vec![Under::Any]
            } else {
                pairs[s]
                    .iter()
                    .filter(|(t, _)| *t == rule.label)
                    .map(|(_, u)| *u)
                    .collect()
            };
            if matched.is_empty() {
                continue;
            }
            let mut changed = false;
            for under in matched {
                changed |= match rule.op {
                    RuleOp::Swap(l) => !any[rule.to] && pairs[rule.to].insert((l, under)),
                    RuleOp::Noop => !any[rule.to] && pairs[rule.to].insert((rule.label, under)),
                    RuleOp::Push(l) => {
                        !any[rule.to] && pairs[rule.to].insert((l, Under::Label(rule.label)))
                    }
                    RuleOp::Pop => match under {
                        Under::Label(x) => !any[rule.to] && pairs[rule.to].insert((x, Under::Any)),
                        Under::Any => {
                            let was = any[rule.to];
                            any[rule.to] = true;
                            !was
                        }
                        // the stack is empty after the pop, no further rule can fire
                        Under::Bottom => false,
                    },
                };
            }
            if changed {
                worklist.push_back(rule.to);
            }
        }
    }
    pda.rules()
        .iter()
        .map(|r| any[r.from] || pairs[r.from].iter().any(|(t, _)| *t == r.label))
        .collect()
}

/// Removes rules that are never enabled or whose target cannot reach an accepting state.
fn prune<W: Weight>(pda: &mut Pda<W>, enabled: &[bool]) {
    // backward co-reachability over the kept rules, on control states only
    let n = pda.num_states();
    let mut rev: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (rid, rule) in pda.rules().iter().enumerate() {
        if enabled[rid] {
            rev[rule.to].push(rule.from);
        }
    }
    let mut useful = vec![false; n];
    let mut worklist: VecDeque<usize> = pda.accepting.iter().copied().collect();
    for &a in &pda.accepting {
        useful[a] = true;
    }
    while let Some(s) = worklist.pop_front() {
        for &p in &rev[s] {
            if !useful[p] {
                useful[p] = true;
                worklist.push_back(p);
            }
        }
    }
    let keep: Vec<bool> = pda
        .rules()
        .iter()
        .zip(enabled.iter())
        .map(|(r, e)| *e && useful[r.to])
        .collect();
    let mut it = keep.iter();
    pda.retain_rules(|_| *it.next().expect("rule count changed during pruning"));
}

/// Removes duplicate rules (same source, premise, effect and target), keeping the smallest
/// weight. Duplicates can carry distinct back-mappings, so the backup reduction levels skip
/// this step.
fn dedup<W: Weight>(pda: &mut Pda<W>) {
    let mut first: HashMap<(usize, usize, RuleOp, usize), usize> = HashMap::new();
    let mut keep = vec![true; pda.rules().len()];
    let mut min_weight: Vec<W> = pda.rules().iter().map(|r| r.weight).collect();
    for (rid, rule) in pda.rules().iter().enumerate() {
        match first.entry((rule.from, rule.label, rule.op, rule.to)) {
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(rid);
            }
            std::collections::hash_map::Entry::Occupied(e) => {
                keep[rid] = false;
                let k = *e.get();
                min_weight[k] = min_weight[k].min(rule.weight);
            }
        }
    }
    for (rid, w) in min_weight.into_iter().enumerate() {
        if keep[rid] {
            pda.rules_mut()[rid].weight = w;
        }
    }
    let mut it = keep.iter();
    pda.retain_rules(|_| *it.next().expect("rule count changed during deduplication"));
}
