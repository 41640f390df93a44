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

//! Nondeterministic finite automata over header and link symbols.
//!
//! The automata are built with the usual Thompson combinators. Edges carry a [`Guard`]: a
//! (possibly negated) set of label patterns, where the negated empty set is the wildcard.
//! Epsilon moves are kept explicit and resolved through closure helpers; the automata are
//! finite and free of consuming cycles through non-consuming states by construction.

use crate::network::Label;
use std::collections::BTreeSet;

/// Edge guard: a set of label patterns, optionally negated. `Guard::wildcard()` matches every
/// label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    /// If set, the guard matches everything *not* in `labels`
    pub negated: bool,
    /// The label patterns of the guard
    pub labels: Vec<Label>,
}

impl Guard {
    /// Guard matching every label.
    pub fn wildcard() -> Self {
        Self { negated: true, labels: Vec::new() }
    }

    /// Guard matching exactly the given label patterns.
    pub fn of(labels: Vec<Label>) -> Self {
        Self { negated: false, labels }
    }

    /// Guard matching everything except the given label patterns.
    pub fn not(labels: Vec<Label>) -> Self {
        Self { negated: true, labels }
    }

    /// Whether the guard matches the concrete label.
    pub fn matches(&self, label: &Label) -> bool {
        let hit = self.labels.iter().any(|p| p.matches(label));
        self.negated != hit
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct State {
    accepting: bool,
    edges: Vec<(Guard, usize)>,
    epsilons: Vec<usize>,
}

/// A nondeterministic finite automaton over labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Nfa {
    states: Vec<State>,
    initial: Vec<usize>,
}

impl Nfa {
    /// Automaton accepting exactly the empty word.
    pub fn empty() -> Self {
        Self { states: vec![State { accepting: true, ..Default::default() }], initial: vec![0] }
    }

    /// Automaton accepting exactly the one-symbol words matched by the guard.
    pub fn symbol(guard: Guard) -> Self {
        Self {
            states: vec![
                State { accepting: false, edges: vec![(guard, 1)], epsilons: vec![] },
                State { accepting: true, ..Default::default() },
            ],
            initial: vec![0],
        }
    }

    /// Appends the states of `other`, returning the index offset.
    fn absorb(&mut self, other: Nfa) -> usize {
        let offset = self.states.len();
        for mut s in other.states {
            for e in s.edges.iter_mut() {
                e.1 += offset;
            }
            for e in s.epsilons.iter_mut() {
                *e += offset;
            }
            self.states.push(s);
        }
        offset
    }

    /// Concatenation: `self` followed by `other`.
    pub fn concat(mut self, other: Nfa) -> Self {
        let other_initial = other.initial.clone();
        let offset = self.absorb(other);
        for s in 0..offset {
            if self.states[s].accepting {
                self.states[s].accepting = false;
                self.states[s].epsilons.extend(other_initial.iter().map(|i| i + offset));
            }
        }
        self
    }

    /// Alternation of the two automata.
    pub fn union(mut self, other: Nfa) -> Self {
        let other_initial = other.initial.clone();
        let offset = self.absorb(other);
        self.initial.extend(other_initial.into_iter().map(|i| i + offset));
        self
    }

    /// Kleene star.
    pub fn star(mut self) -> Self {
        let starts = self.initial.clone();
        for s in 0..self.states.len() {
            if self.states[s].accepting {
                self.states[s].epsilons.extend(starts.iter().copied());
            }
        }
        let new = self.states.len();
        self.states.push(State { accepting: true, edges: vec![], epsilons: starts });
        self.initial = vec![new];
        self
    }

    /// One or more repetitions.
    pub fn plus(self) -> Self {
        let rep = self.clone().star();
        self.concat(rep)
    }

    /// Zero or one occurrence.
    pub fn optional(self) -> Self {
        self.union(Nfa::empty())
    }

    /// Number of states.
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Whether the state itself is marked accepting (without epsilon closure).
    pub fn accepting(&self, state: usize) -> bool {
        self.states[state].accepting
    }

    /// Epsilon closure of a set of states.
    pub fn closure(&self, states: impl IntoIterator<Item = usize>) -> BTreeSet<usize> {
        let mut set: BTreeSet<usize> = states.into_iter().collect();
        let mut stack: Vec<usize> = set.iter().copied().collect();
        while let Some(s) = stack.pop() {
            for &t in &self.states[s].epsilons {
                if set.insert(t) {
                    stack.push(t);
                }
            }
        }
        set
    }

    /// Epsilon closure of the initial states.
    pub fn initial_closure(&self) -> BTreeSet<usize> {
        self.closure(self.initial.iter().copied())
    }

    /// Whether the epsilon closure of `state` contains an accepting state.
    pub fn closure_accepting(&self, state: usize) -> bool {
        self.closure([state]).into_iter().any(|s| self.states[s].accepting)
    }

    /// Whether the automaton accepts the empty word.
    pub fn accepts_empty(&self) -> bool {
        self.initial_closure().into_iter().any(|s| self.states[s].accepting)
    }

    /// All consuming edges reachable from `state` through epsilon moves.
    pub fn closed_edges(&self, state: usize) -> Vec<(&Guard, usize)> {
        self.closure([state])
            .into_iter()
            .flat_map(|s| self.states[s].edges.iter().map(|(g, t)| (g, *t)))
            .collect()
    }

    /// All consuming edges leaving the initial states (through epsilon moves).
    pub fn closed_initial_edges(&self) -> Vec<(&Guard, usize)> {
        self.initial_closure()
            .into_iter()
            .flat_map(|s| self.states[s].edges.iter().map(|(g, t)| (g, *t)))
            .collect()
    }

    /// Runs the automaton on a word of concrete labels.
    pub fn accepts(&self, word: &[Label]) -> bool {
        let mut current = self.initial_closure();
        for label in word {
            let mut next = BTreeSet::new();
            for s in current {
                for (g, t) in self.states[s].edges.iter() {
                    if g.matches(label) {
                        next.insert(*t);
                    }
                }
            }
            if next.is_empty() {
                return false;
            }
            current = self.closure(next);
        }
        current.into_iter().any(|s| self.states[s].accepting)
    }

    /// All label patterns mentioned positively in any guard. Used to seed the label alphabet of
    /// the pushdown translation.
    pub fn mentioned_labels(&self) -> Vec<Label> {
        self.states
            .iter()
            .flat_map(|s| s.edges.iter())
            .flat_map(|(g, _)| g.labels.iter().copied())
            .collect()
    }
}
