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

//! The weighted pushdown system solved by the saturation algorithms.
//!
//! Control states and stack symbols are dense indices; the label alphabet maps symbol indices
//! back to concrete [`Label`]s. Each rule rewrites the top of the stack (`Noop`, `Pop`,
//! `Swap`, `Push`) while moving between control states, and carries a weight from an additive
//! semiring: the unit semiring `()` for plain reachability, `u32` for shortest traces.

use crate::network::Label;

/// Additive semiring capability of rule weights: a zero (the neutral element of
/// [`combine`](Weight::combine)), an associative combine, and a total order for the shortest
/// search. The unit type is the trivial semiring used for unweighted reachability.
pub trait Weight: Copy + Ord + std::fmt::Debug + Default {
    /// Neutral element.
    fn zero() -> Self;
    /// Adds two weights.
    fn combine(self, other: Self) -> Self;
    /// Serialisable form for the `trace-weight` output; `None` for the unit semiring.
    fn report(self) -> Option<Vec<u32>> {
        None
    }
}

impl Weight for () {
    fn zero() -> Self {}
    fn combine(self, _other: Self) -> Self {}
}

impl Weight for u32 {
    fn zero() -> Self {
        0
    }
    fn combine(self, other: Self) -> Self {
        self.saturating_add(other)
    }
    fn report(self) -> Option<Vec<u32>> {
        Some(vec![self])
    }
}

/// Stack effect of a rule. `Swap` and `Push` reference symbol indices of the PDA alphabet;
/// `Push(l)` pushes `l` *on top of* the matched symbol, growing the stack by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleOp {
    /// Leave the stack unchanged
    Noop,
    /// Remove the top symbol
    Pop,
    /// Replace the top symbol
    Swap(usize),
    /// Push a new symbol above the matched one
    Push(usize),
}

/// One rule of the pushdown system: in control state `from` with `label` on top of the stack,
/// apply `op` and continue in `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule<W> {
    /// Source control state
    pub from: usize,
    /// Matched top-of-stack symbol index
    pub label: usize,
    /// Stack effect
    pub op: RuleOp,
    /// Target control state
    pub to: usize,
    /// Rule weight
    pub weight: W,
    /// Opaque back-mapping tag assigned by the factory
    pub origin: usize,
}

/// A weighted pushdown system together with its initial and accepting control states.
#[derive(Debug, Clone)]
pub struct Pda<W> {
    labels: Vec<Label>,
    num_states: usize,
    rules: Vec<Rule<W>>,
    rules_from: Vec<Vec<usize>>,
    /// Initial control states
    pub initial: Vec<usize>,
    /// Accepting control states
    pub accepting: Vec<usize>,
}

impl<W: Weight> Pda<W> {
    /// Assembles a PDA from its parts and builds the per-state rule index.
    pub fn new(
        labels: Vec<Label>,
        num_states: usize,
        rules: Vec<Rule<W>>,
        initial: Vec<usize>,
        accepting: Vec<usize>,
    ) -> Self {
        let mut pda = Self { labels, num_states, rules, rules_from: Vec::new(), initial, accepting };
        pda.rebuild_index();
        pda
    }

    /// The stack-symbol alphabet.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// The label behind a symbol index.
    pub fn label(&self, idx: usize) -> Label {
        self.labels[idx]
    }

    /// Number of control states.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// All rules.
    pub fn rules(&self) -> &[Rule<W>] {
        &self.rules
    }

    /// One rule by index.
    pub fn rule(&self, id: usize) -> &Rule<W> {
        &self.rules[id]
    }

    /// Indices of the rules leaving the given control state.
    pub fn rules_from(&self, state: usize) -> &[usize] {
        &self.rules_from[state]
    }

    /// Indices of all alphabet symbols matched by the guard.
    pub fn matching_symbols(&self, guard: &crate::query::Guard) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| guard.matches(l))
            .map(|(i, _)| i)
            .collect()
    }

    /// Mutable access to the rule list. Callers must
    /// [`rebuild_index`](Self::rebuild_index) after structural changes.
    pub fn rules_mut(&mut self) -> &mut Vec<Rule<W>> {
        &mut self.rules
    }

    /// Keeps only the rules satisfying the predicate; used by the reducer.
    pub fn retain_rules(&mut self, mut keep: impl FnMut(&Rule<W>) -> bool) {
        self.rules.retain(|r| keep(r));
        self.rebuild_index();
    }

    /// Rebuilds the per-state rule index after the rule set changed.
    pub fn rebuild_index(&mut self) {
        self.rules_from = vec![Vec::new(); self.num_states];
        for (i, r) in self.rules.iter().enumerate() {
            self.rules_from[r.from].push(i);
        }
    }

    /// Checks the structural consistency of every rule: state and symbol indices must be in
    /// range. Violations are internal bugs of the construction.
    pub fn check_consistency(&self) -> bool {
        self.rules.iter().all(|r| {
            r.from < self.num_states
                && r.to < self.num_states
                && r.label < self.labels.len()
                && match r.op {
                    RuleOp::Swap(l) | RuleOp::Push(l) => l < self.labels.len(),
                    RuleOp::Noop | RuleOp::Pop => true,
                }
        }) && self.initial.iter().chain(self.accepting.iter()).all(|s| *s < self.num_states)
    }
}
