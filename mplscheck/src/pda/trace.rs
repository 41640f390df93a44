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

//! Witness extraction from a saturated P-automaton.
//!
//! During saturation every added edge records a [`Provenance`]: the rule and the predecessor
//! edges that justified it. Walking these justifications turns an accepting path of the
//! automaton back into the sequence of configurations and rules from an initial to an accepting
//! configuration. The walk is well-founded because every justification references edges settled
//! strictly earlier.

use super::pds::{Pda, Weight};
use super::solver::PAutomaton;
use serde::Serialize;
use std::collections::VecDeque;

/// An edge of the P-automaton: `(source, symbol, target)`, where `None` is the epsilon symbol.
pub type EdgeKey = (usize, Option<usize>, usize);

/// Why an edge is part of the saturated automaton.
#[derive(Debug, Clone)]
pub enum Provenance {
    /// Part of the seed automaton
    Seed,
    /// post*: a swap (or noop) rule applied to the predecessor edge
    Swap {
        /// applied rule
        rule: usize,
        /// the edge the rule fired on
        from: EdgeKey,
    },
    /// post*: a pop rule turned the predecessor edge into this epsilon edge
    Pop {
        /// applied rule
        rule: usize,
        /// the edge the rule fired on
        from: EdgeKey,
    },
    /// post*: the first half of a push rule (into the auxiliary state of the rule)
    PushFirst {
        /// applied rule
        rule: usize,
    },
    /// post*: the second half of a push rule (out of the auxiliary state)
    PushSecond {
        /// applied rule
        rule: usize,
        /// the edge the rule fired on
        from: EdgeKey,
    },
    /// post*: composition of an epsilon edge with a following edge
    EpsCombine {
        /// the epsilon edge
        eps: EdgeKey,
        /// the following non-epsilon edge
        base: EdgeKey,
    },
    /// pre*: a rule applied backwards; `mids` is the automaton path matching the rule's
    /// right-hand side (empty for pop, one edge for swap, two for push)
    PreRule {
        /// applied rule
        rule: usize,
        /// justifying path
        mids: Vec<EdgeKey>,
    },
}

/// One configuration of the PDA: a control state and the stack, top first, as symbol indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceState {
    /// control state
    pub state: usize,
    /// label stack, top of stack first
    pub stack: Vec<usize>,
}

/// A complete witness: the configurations from the initial to the accepting one, the rule
/// applied between each pair of consecutive configurations, and the total weight.
#[derive(Debug, Clone)]
pub struct Trace<W> {
    /// configuration sequence
    pub states: Vec<TraceState>,
    /// applied rule ids, `states.len() - 1` many
    pub rules: Vec<usize>,
    /// accumulated weight of the applied rules
    pub weight: W,
}

/// One step of the lifted network trace.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TraceStep {
    /// name of the router the packet is at
    pub router: String,
    /// the full label stack, top first
    pub stack: Vec<String>,
    /// outgoing interface of the applied rule, when the step moves the packet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    /// rendered stack operations of the applied rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops: Option<String>,
}

fn read_config(state: usize, path: &VecDeque<EdgeKey>) -> TraceState {
    TraceState { state, stack: path.iter().filter_map(|e| e.1).collect() }
}

/// Unwinds a post*-saturated accepting path (starting at the accepting control state) back to
/// the initial configuration. Returns configurations and rules in forward order.
pub fn unwind_post<W: Weight>(
    auto: &PAutomaton<W>,
    start: usize,
    path: Vec<EdgeKey>,
) -> (Vec<TraceState>, Vec<usize>) {
    let mut path: VecDeque<EdgeKey> = path.into();
    let mut state = start;
    let mut configs = vec![read_config(state, &path)];
    let mut rules = Vec::new();
    loop {
        let Some(&first) = path.front() else { break };
        match auto.provenance(&first).clone() {
            Provenance::Seed => break,
            Provenance::EpsCombine { eps, base } => {
                // expand the composition; the configuration is unchanged
                path.pop_front();
                path.push_front(base);
                path.push_front(eps);
            }
            Provenance::Swap { rule, from } => {
                path.pop_front();
                path.push_front(from);
                state = from.0;
                rules.push(rule);
                configs.push(read_config(state, &path));
            }
            Provenance::Pop { rule, from } => {
                path.pop_front();
                path.push_front(from);
                state = from.0;
                rules.push(rule);
                configs.push(read_config(state, &path));
            }
            Provenance::PushFirst { rule } => {
                path.pop_front();
                let second = path.pop_front().expect("push companion edge missing");
                let Provenance::PushSecond { rule: second_rule, from } =
                    auto.provenance(&second).clone()
                else {
                    unreachable!("edge out of an auxiliary state without push provenance")
                };
                debug_assert_eq!(rule, second_rule);
                path.push_front(from);
                state = from.0;
                rules.push(rule);
                configs.push(read_config(state, &path));
            }
            Provenance::PushSecond { .. } | Provenance::PreRule { .. } => {
                unreachable!("provenance kind cannot start a configuration path")
            }
        }
    }
    configs.reverse();
    rules.reverse();
    (configs, rules)
}

/// Unwinds a pre*-saturated accepting path (starting at an initial control state) forward to an
/// accepting configuration. Returns configurations and rules in forward order.
pub fn unwind_pre<W: Weight>(
    auto: &PAutomaton<W>,
    pda: &Pda<W>,
    start: usize,
    path: Vec<EdgeKey>,
) -> (Vec<TraceState>, Vec<usize>) {
    let mut path: VecDeque<EdgeKey> = path.into();
    let mut state = start;
    let mut configs = vec![read_config(state, &path)];
    let mut rules = Vec::new();
    loop {
        let Some(&first) = path.front() else { break };
        match auto.provenance(&first).clone() {
            Provenance::Seed => break,
            Provenance::PreRule { rule, mids } => {
                path.pop_front();
                for m in mids.into_iter().rev() {
                    path.push_front(m);
                }
                state = pda.rule(rule).to;
                rules.push(rule);
                configs.push(read_config(state, &path));
            }
            _ => unreachable!("post* provenance in a pre* automaton"),
        }
    }
    (configs, rules)
}
