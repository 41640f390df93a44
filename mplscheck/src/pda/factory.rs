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

//! Translation of a network and a query into a pushdown system.
//!
//! The PDA stack is the MPLS label stack; a control state encodes the router the packet is at,
//! the state of the path automaton, the approximation counter, and, while a multi-operation
//! rule is being applied, the position inside that rule (table, entry, rule and operation
//! index). States are interned on the fly and rules are generated state by state, so only the
//! reachable part of the product is ever materialised.
//!
//! Crossing a link consumes the link symbol of the egress interface in the path automaton. The
//! approximation counter realises the failure bound: in over-approximation any rule with
//! failure rank at most k is admitted, in under-approximation (and the exact encoding) the
//! ranks accumulate and are cut off at k. Acceptance folds the optional final hop out of the
//! network into the state predicate, so no rules are needed at the null router.

use super::pds::{Pda, Rule, RuleOp, Weight};
use super::trace::{TraceState, TraceStep};
use crate::network::{Entry, Forward, ForwardKind, InterfaceId, Label, Network, Op, RouterId};
use crate::query::{ApproximationMode, Query};
use itertools::Itertools;
use log::{debug, trace};
use std::collections::{BTreeSet, HashMap, HashSet};

/// A control state of the constructed PDA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NState {
    /// router the packet is at
    router: RouterId,
    /// state of the path automaton
    nfa: u32,
    /// approximation counter
    appmode: u32,
    /// index of the next operation of a partially applied rule, or -1 for a clean state
    opid: i32,
    /// routing table index of the partially applied rule
    tid: u32,
    /// entry index of the partially applied rule
    eid: u32,
    /// rule index of the partially applied rule
    rid: u32,
}

impl NState {
    fn clean(router: RouterId, nfa: usize, appmode: u32) -> Self {
        Self { router, nfa: nfa as u32, appmode, opid: -1, tid: 0, eid: 0, rid: 0 }
    }
}

/// Back-mapping from an emitted PDA rule to the routing rule it came from.
#[derive(Debug, Clone, Copy)]
struct RuleOrigin {
    router: RouterId,
    tid: usize,
    eid: usize,
    rid: usize,
    /// operation offset inside the routing rule (0 = first)
    op: usize,
}

/// Factory translating a network plus a query into a [`Pda`]. Keep the factory alive after
/// [`compile`](Self::compile): it holds the back-mappings needed to lift a solver trace into a
/// network trace.
#[derive(Debug)]
pub struct NetworkPdaFactory<'n, W> {
    net: &'n Network,
    query: &'n Query,
    mode: ApproximationMode,
    labels: Vec<Label>,
    label_map: HashMap<Label, usize>,
    states: Vec<NState>,
    state_map: HashMap<NState, usize>,
    accepting: Vec<bool>,
    initial: Vec<usize>,
    rules: Vec<Rule<W>>,
    origins: Vec<RuleOrigin>,
}

impl<'n, W: Weight> NetworkPdaFactory<'n, W> {
    /// Prepares a factory for the given concrete approximation mode (`Dual` is resolved by the
    /// verifier before this point).
    pub fn new(net: &'n Network, query: &'n Query, mode: ApproximationMode) -> Self {
        debug_assert!(mode != ApproximationMode::Dual);
        let labels = collect_alphabet(net, query);
        let label_map = labels.iter().enumerate().map(|(i, l)| (*l, i)).collect();
        Self {
            net,
            query,
            mode,
            labels,
            label_map,
            states: Vec::new(),
            state_map: HashMap::new(),
            accepting: Vec::new(),
            initial: Vec::new(),
            rules: Vec::new(),
            origins: Vec::new(),
        }
    }

    /// Builds the PDA. `weight` annotates every emitted rule derived from a routing rule; use
    /// `|_, _, _| ()` for unweighted verification.
    pub fn compile<F>(&mut self, weight: &F) -> Pda<W>
    where
        F: Fn(&Network, &Entry, &Forward) -> W,
    {
        self.construct_initial();
        let mut next = 0;
        while next < self.states.len() {
            self.expand(next, weight);
            next += 1;
        }
        let accepting: Vec<usize> =
            self.accepting.iter().enumerate().filter(|(_, a)| **a).map(|(i, _)| i).collect();
        debug!(
            "compiled PDA: {} states, {} rules, {} labels, {} initial, {} accepting",
            self.states.len(),
            self.rules.len(),
            self.labels.len(),
            self.initial.len(),
            accepting.len()
        );
        Pda::new(
            self.labels.clone(),
            self.states.len(),
            self.rules.clone(),
            self.initial.clone(),
            accepting,
        )
    }

    /// The packet may start behind any link whose traversal the path automaton can consume
    /// first: the cross product of the initial automaton states with every interface of the
    /// network.
    fn construct_initial(&mut self) {
        let net = self.net;
        let query = self.query;
        for id in net.interface_ids() {
            let Some(router) = net.link_target(id) else { continue };
            for (guard, target) in query.path.closed_initial_edges() {
                if !guard.matches(&Label::Interface(id)) {
                    continue;
                }
                let state = self.add_state(NState::clean(router, target, 0));
                if !self.initial.contains(&state) {
                    self.initial.push(state);
                }
            }
        }
    }

    fn add_state(&mut self, ns: NState) -> usize {
        if let Some(&id) = self.state_map.get(&ns) {
            return id;
        }
        let id = self.states.len();
        self.states.push(ns);
        self.state_map.insert(ns, id);
        self.accepting.push(self.is_accepting(&ns));
        id
    }

    /// A state accepts when it is clean and the path automaton accepts, either directly or
    /// after one final hop out of the network.
    fn is_accepting(&self, ns: &NState) -> bool {
        if ns.opid >= 0 {
            return false;
        }
        let nfa = ns.nfa as usize;
        if self.query.path.closure_accepting(nfa) {
            return true;
        }
        self.net.null_interfaces(ns.router).into_iter().any(|i| {
            let sym = Label::Interface(i);
            self.query
                .path
                .closed_edges(nfa)
                .into_iter()
                .any(|(g, t)| g.matches(&sym) && self.query.path.closure_accepting(t))
        })
    }

    /// The approximation policy: the next counter value for taking a rule of failure rank
    /// `weight`, or `None` if the rule is not admitted.
    fn approximate(&self, appmode: u32, weight: u32) -> Option<u32> {
        let k = self.query.failures as u32;
        match self.mode {
            ApproximationMode::Over => (weight <= k).then_some(0),
            ApproximationMode::Under | ApproximationMode::Exact => {
                let next = appmode + weight;
                (next <= k).then_some(next)
            }
            ApproximationMode::Dual => unreachable!("dual mode is split before compilation"),
        }
    }

    fn expand<F>(&mut self, id: usize, weight: &F)
    where
        F: Fn(&Network, &Entry, &Forward) -> W,
    {
        let ns = self.states[id];
        if self.net.router(ns.router).is_null() {
            // packets do not come back
            return;
        }
        if ns.opid >= 0 {
            self.expand_mid(id, ns);
        } else {
            self.expand_clean(id, ns, weight);
        }
    }

    /// Emits the first PDA rule of every applicable routing rule of the router.
    fn expand_clean<F>(&mut self, id: usize, ns: NState, weight: &F)
    where
        F: Fn(&Network, &Entry, &Forward) -> W,
    {
        let net = self.net;
        let query = self.query;
        let router = net.router(ns.router);
        for (tid, table) in router.tables().iter().enumerate() {
            for (eid, entry) in table.entries().iter().enumerate() {
                if !entry.top_label.is_stack_symbol() {
                    continue;
                }
                let pres = self.expand_pattern(&entry.top_label);
                if pres.is_empty() {
                    continue;
                }
                for (rid, fwd) in entry.forwards.iter().enumerate() {
                    if fwd.kind != ForwardKind::Mpls {
                        // the packet leaves label switching (or dies); nothing to emit
                        continue;
                    }
                    let Some(via) = fwd.via else { continue };
                    let Some(next_router) = net.link_target(via) else { continue };
                    let Some(appmode) = self.approximate(ns.appmode, fwd.weight) else {
                        continue;
                    };
                    let link = Label::Interface(via);
                    let w = weight(net, entry, fwd);
                    for (guard, target) in query.path.closed_edges(ns.nfa as usize) {
                        if !guard.matches(&link) {
                            continue;
                        }
                        trace!(
                            "rule at {} towards {} ({} ops)",
                            router.name(),
                            net.router(next_router).name(),
                            fwd.ops.len()
                        );
                        let op = self.map_op(fwd.ops.first());
                        let to = if fwd.ops.len() <= 1 {
                            self.add_state(NState::clean(next_router, target, appmode))
                        } else {
                            self.add_state(NState {
                                router: ns.router,
                                nfa: target as u32,
                                appmode,
                                opid: 1,
                                tid: tid as u32,
                                eid: eid as u32,
                                rid: rid as u32,
                            })
                        };
                        for &pre in &pres {
                            self.push_rule(
                                id,
                                pre,
                                op,
                                to,
                                w,
                                RuleOrigin { router: ns.router, tid, eid, rid, op: 0 },
                            );
                        }
                    }
                }
            }
        }
    }

    /// Emits the next PDA rule of a partially applied multi-operation routing rule.
    fn expand_mid(&mut self, id: usize, ns: NState) {
        let net = self.net;
        let (tid, eid, rid, opid) =
            (ns.tid as usize, ns.eid as usize, ns.rid as usize, ns.opid as usize);
        let entry = &net.router(ns.router).tables()[tid].entries()[eid];
        let fwd = &entry.forwards[rid];
        let Some(via) = fwd.via else { return };
        let Some(next_router) = net.link_target(via) else { return };
        // the top of the stack is determined by the previous operation
        let pres: Vec<usize> = match fwd.ops[opid - 1] {
            Op::Swap(l) | Op::Push(l) => vec![self.label_map[&l]],
            Op::Pop => (0..self.labels.len()).collect(),
        };
        let op = self.map_op(fwd.ops.get(opid));
        let last = opid + 1 >= fwd.ops.len();
        let to = if last {
            self.add_state(NState::clean(next_router, ns.nfa as usize, ns.appmode))
        } else {
            self.add_state(NState { opid: ns.opid + 1, ..ns })
        };
        for pre in pres {
            self.push_rule(
                id,
                pre,
                op,
                to,
                W::zero(),
                RuleOrigin { router: ns.router, tid, eid, rid, op: opid },
            );
        }
    }

    fn push_rule(
        &mut self,
        from: usize,
        label: usize,
        op: RuleOp,
        to: usize,
        weight: W,
        origin: RuleOrigin,
    ) {
        let origin_id = self.origins.len();
        self.origins.push(origin);
        self.rules.push(Rule { from, label, op, to, weight, origin: origin_id });
    }

    fn map_op(&self, op: Option<&Op>) -> RuleOp {
        match op {
            None => RuleOp::Noop,
            Some(Op::Pop) => RuleOp::Pop,
            Some(Op::Swap(l)) => RuleOp::Swap(self.label_map[l]),
            Some(Op::Push(l)) => RuleOp::Push(self.label_map[l]),
        }
    }

    /// Expands a top-label pattern of a routing entry to the matching alphabet symbols.
    fn expand_pattern(&self, pattern: &Label) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| pattern.matches(l))
            .map(|(i, _)| i)
            .collect()
    }

    fn origin_of(&self, pda: &Pda<W>, rule_id: usize) -> RuleOrigin {
        self.origins[pda.rule(rule_id).origin]
    }

    fn lookup(&self, origin: &RuleOrigin) -> (&'n Entry, &'n Forward) {
        let entry = &self.net.router(origin.router).tables()[origin.tid].entries()[origin.eid];
        (entry, &entry.forwards[origin.rid])
    }

    /// Lifts a solver trace back to a network trace: one step per visited router, with the full
    /// label stack and the applied forwarding rule. Returns `None` when the witness cannot be
    /// concretised with at most k link failures, i.e. it is spurious.
    pub fn write_trace(
        &self,
        pda: &Pda<W>,
        states: &[TraceState],
        rules: &[usize],
    ) -> Option<Vec<TraceStep>> {
        if !self.concretise(pda, rules) {
            return None;
        }
        let mut steps = Vec::new();
        for (i, ts) in states.iter().enumerate() {
            let ns = self.states[ts.state];
            if ns.opid >= 0 {
                // synthetic state in the middle of a multi-operation rule
                continue;
            }
            let mut step = TraceStep {
                router: self.net.router(ns.router).name().to_string(),
                stack: ts.stack.iter().map(|&l| pda.label(l).to_string()).collect(),
                interface: None,
                ops: None,
            };
            if i < rules.len() {
                let origin = self.origin_of(pda, rules[i]);
                let (_, fwd) = self.lookup(&origin);
                step.interface = fwd.via.map(|v| self.net.interface_full_name(v));
                if !fwd.ops.is_empty() {
                    step.ops = Some(fwd.ops.iter().map(ToString::to_string).join(", "));
                }
            }
            steps.push(step);
        }
        Some(steps)
    }

    /// Checks that the witness is realisable: taking a rule of failure rank w requires all
    /// lower-ranked alternatives of its entry to be failed, the union of those failed links must
    /// stay within the failure bound, and no traversed link may be failed.
    fn concretise(&self, pda: &Pda<W>, rules: &[usize]) -> bool {
        let mut failed: HashSet<InterfaceId> = HashSet::new();
        let mut used: HashSet<InterfaceId> = HashSet::new();
        for &rid in rules {
            let origin = self.origin_of(pda, rid);
            if origin.op != 0 {
                continue;
            }
            let (entry, fwd) = self.lookup(&origin);
            if let Some(via) = fwd.via {
                used.insert(via);
            }
            for other in &entry.forwards {
                if other.weight < fwd.weight {
                    if let Some(via) = other.via {
                        failed.insert(via);
                    }
                }
            }
        }
        failed.len() <= self.query.failures && failed.is_disjoint(&used)
    }
}

/// The concrete stack alphabet: every concrete label of the routing tables and of the two
/// header constraints. Wildcard patterns of entries and guards range over this set.
fn collect_alphabet(net: &Network, query: &Query) -> Vec<Label> {
    let mut set: BTreeSet<Label> = BTreeSet::new();
    let mut add = |set: &mut BTreeSet<Label>, l: &Label| {
        if matches!(l, Label::Mpls(_) | Label::Ip4 { .. } | Label::Ip6 { .. }) {
            set.insert(*l);
        }
    };
    for router in net.router_ids().collect::<Vec<_>>() {
        for table in net.router(router).tables() {
            for entry in table.entries() {
                add(&mut set, &entry.top_label);
                for fwd in &entry.forwards {
                    for op in &fwd.ops {
                        match op {
                            Op::Push(l) | Op::Swap(l) => add(&mut set, l),
                            Op::Pop => {}
                        }
                    }
                }
            }
        }
    }
    for l in query.initial_header.mentioned_labels() {
        add(&mut set, &l);
    }
    for l in query.final_header.mentioned_labels() {
        add(&mut set, &l);
    }
    set.into_iter().collect()
}
