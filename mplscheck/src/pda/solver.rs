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

//! Saturation of a P-automaton: pre* and post* over a weighted pushdown system.
//!
//! A P-automaton recognises a regular set of PDA configurations: its initial states are the
//! control states of the PDA, its words are label stacks. The solver seeds the automaton with
//! the regular header constraint of the query and saturates it with the standard worklist
//! algorithms; the worklist is a priority queue ordered by accumulated weight, so the same code
//! path computes any-trace (unit weights) and shortest-trace (`u32` weights) answers. Since the
//! weight domain has no negative elements, every edge is settled at its minimal weight and the
//! saturation terminates for every finite PDA and seed.
//!
//! The header constraints of the query are *not* part of the PDA: the initial-header automaton
//! forms the seed, and the final-header automaton is intersected with the saturated result by a
//! product search at the end.

use super::pds::{Pda, RuleOp, Weight};
use super::trace::{unwind_post, unwind_pre, EdgeKey, Provenance, Trace};
use crate::query::{Nfa, Query};
use log::debug;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Outcome of a saturation run.
#[derive(Debug)]
pub struct SolveResult<W> {
    /// Whether an accepting configuration is reachable (post*) or can be reached (pre*)
    pub non_empty: bool,
    /// The witness, if one exists
    pub trace: Option<Trace<W>>,
}

/// A saturated P-automaton. States `0..num_control` are the control states of the PDA; the
/// remaining states stem from the seeding header automaton and from push rules (one auxiliary
/// state per push rule).
#[derive(Debug)]
pub struct PAutomaton<W> {
    num_control: usize,
    num_states: usize,
    settled: HashMap<EdgeKey, (W, Provenance)>,
    out: Vec<Vec<EdgeKey>>,
    finals: Vec<bool>,
}

impl<W: Weight> PAutomaton<W> {
    /// The provenance of a settled edge.
    pub fn provenance(&self, edge: &EdgeKey) -> &Provenance {
        &self.settled.get(edge).expect("edge not part of the automaton").1
    }

    /// The weight of a settled edge.
    pub fn weight(&self, edge: &EdgeKey) -> W {
        self.settled.get(edge).expect("edge not part of the automaton").0
    }

    /// All settled edges leaving the state.
    pub fn out_edges(&self, state: usize) -> &[EdgeKey] {
        &self.out[state]
    }

    /// Whether the state is accepting.
    pub fn is_final(&self, state: usize) -> bool {
        self.finals[state]
    }

    /// Number of settled edges.
    pub fn num_edges(&self) -> usize {
        self.settled.len()
    }
}

/// Computes post*: all configurations reachable from the initial configurations (initial
/// control states with an initial-header stack), and searches for an accepting control state
/// holding a final-header stack.
pub fn post_star<W: Weight>(pda: &Pda<W>, query: &Query) -> SolveResult<W> {
    let mut sat = Saturator::new(pda, &query.initial_header, &pda.initial);
    sat.run_post(pda);
    let auto = sat.finish();
    debug!("post* saturated: {} edges", auto.num_edges());
    match find_accepting_path(&auto, pda, &pda.accepting, &query.final_header) {
        None => SolveResult { non_empty: false, trace: None },
        Some((start, path, weight)) => {
            let (states, rules) = unwind_post(&auto, start, path);
            SolveResult { non_empty: true, trace: Some(Trace { states, rules, weight }) }
        }
    }
}

/// Computes pre*: all configurations from which an accepting configuration (accepting control
/// state with a final-header stack) is reachable, and searches for an initial control state
/// holding an initial-header stack.
pub fn pre_star<W: Weight>(pda: &Pda<W>, query: &Query) -> SolveResult<W> {
    let mut sat = Saturator::new(pda, &query.final_header, &pda.accepting);
    sat.run_pre(pda);
    let auto = sat.finish();
    debug!("pre* saturated: {} edges", auto.num_edges());
    match find_accepting_path(&auto, pda, &pda.initial, &query.initial_header) {
        None => SolveResult { non_empty: false, trace: None },
        Some((start, path, weight)) => {
            let (states, rules) = unwind_pre(&auto, pda, start, path);
            SolveResult { non_empty: true, trace: Some(Trace { states, rules, weight }) }
        }
    }
}

/// Worklist saturation state shared by pre* and post*.
struct Saturator<W: Weight> {
    num_control: usize,
    num_states: usize,
    settled: HashMap<EdgeKey, (W, Provenance)>,
    best: HashMap<EdgeKey, W>,
    cand_prov: HashMap<EdgeKey, Provenance>,
    queue: BinaryHeap<Reverse<(W, EdgeKey)>>,
    out: Vec<Vec<EdgeKey>>,
    eps_in: Vec<Vec<EdgeKey>>,
    finals: Vec<bool>,
    aux_of_rule: HashMap<usize, usize>,
}

impl<W: Weight> Saturator<W> {
    /// Builds the seed automaton: for every control state in `anchors`, the language of the
    /// header automaton, sharing one copy of the header states.
    fn new(pda: &Pda<W>, header: &Nfa, anchors: &[usize]) -> Self {
        let num_control = pda.num_states();
        let offset = num_control;
        let num_states = num_control + header.num_states();
        let mut finals = vec![false; num_states];
        for s in 0..header.num_states() {
            finals[offset + s] = header.closure_accepting(s);
        }
        if header.accepts_empty() {
            for &a in anchors {
                finals[a] = true;
            }
        }
        let mut sat = Self {
            num_control,
            num_states,
            settled: HashMap::new(),
            best: HashMap::new(),
            cand_prov: HashMap::new(),
            queue: BinaryHeap::new(),
            out: vec![Vec::new(); num_states],
            eps_in: vec![Vec::new(); num_states],
            finals,
            aux_of_rule: HashMap::new(),
        };
        for &a in anchors {
            for (guard, t) in header.closed_initial_edges() {
                for sym in pda.matching_symbols(guard) {
                    sat.insert((a, Some(sym), offset + t), W::zero(), Provenance::Seed);
                }
            }
        }
        for s in 0..header.num_states() {
            for (guard, t) in header.closed_edges(s) {
                for sym in pda.matching_symbols(guard) {
                    sat.insert((offset + s, Some(sym), offset + t), W::zero(), Provenance::Seed);
                }
            }
        }
        sat
    }

    fn insert(&mut self, edge: EdgeKey, weight: W, prov: Provenance) {
        if self.settled.contains_key(&edge) {
            return;
        }
        if let Some(old) = self.best.get(&edge) {
            if *old <= weight {
                return;
            }
        }
        self.best.insert(edge, weight);
        self.cand_prov.insert(edge, prov);
        self.queue.push(Reverse((weight, edge)));
    }

    fn settle(&mut self, edge: EdgeKey, weight: W, prov: Provenance) {
        self.settled.insert(edge, (weight, prov));
        self.out[edge.0].push(edge);
        if edge.1.is_none() {
            self.eps_in[edge.2].push(edge);
        }
    }

    fn aux_state(&mut self, rule: usize) -> usize {
        if let Some(&s) = self.aux_of_rule.get(&rule) {
            return s;
        }
        let s = self.num_states;
        self.num_states += 1;
        self.out.push(Vec::new());
        self.eps_in.push(Vec::new());
        self.finals.push(false);
        self.aux_of_rule.insert(rule, s);
        s
    }

    /// post* saturation: pops the cheapest pending edge and applies every rule whose premise it
    /// completes, until the worklist is empty.
    fn run_post(&mut self, pda: &Pda<W>) {
        while let Some(Reverse((weight, edge))) = self.queue.pop() {
            if self.settled.contains_key(&edge) || self.best.get(&edge) != Some(&weight) {
                continue;
            }
            let prov = self.cand_prov.remove(&edge).expect("pending edge without provenance");
            self.settle(edge, weight, prov);
            let (p, symbol, q) = edge;
            match symbol {
                None => {
                    // epsilon edge: compose with every settled edge out of q
                    let bases: Vec<EdgeKey> =
                        self.out[q].iter().copied().filter(|e| e.1.is_some()).collect();
                    for base in bases {
                        let w = weight.combine(self.settled[&base].0);
                        self.insert(
                            (p, base.1, base.2),
                            w,
                            Provenance::EpsCombine { eps: edge, base },
                        );
                    }
                }
                Some(symbol) => {
                    if p < self.num_control {
                        for &rid in pda.rules_from(p) {
                            let rule = pda.rule(rid);
                            if rule.label != symbol {
                                continue;
                            }
                            let w = weight.combine(rule.weight);
                            match rule.op {
                                RuleOp::Pop => self.insert(
                                    (rule.to, None, q),
                                    w,
                                    Provenance::Pop { rule: rid, from: edge },
                                ),
                                RuleOp::Swap(l) => self.insert(
                                    (rule.to, Some(l), q),
                                    w,
                                    Provenance::Swap { rule: rid, from: edge },
                                ),
                                RuleOp::Noop => self.insert(
                                    (rule.to, Some(symbol), q),
                                    w,
                                    Provenance::Swap { rule: rid, from: edge },
                                ),
                                RuleOp::Push(l) => {
                                    let aux = self.aux_state(rid);
                                    self.insert(
                                        (rule.to, Some(l), aux),
                                        W::zero(),
                                        Provenance::PushFirst { rule: rid },
                                    );
                                    self.insert(
                                        (aux, Some(symbol), q),
                                        w,
                                        Provenance::PushSecond { rule: rid, from: edge },
                                    );
                                }
                            }
                        }
                    }
                    // compose with every settled epsilon edge ending in p
                    let eps_edges: Vec<EdgeKey> = self.eps_in[p].clone();
                    for eps in eps_edges {
                        let w = self.settled[&eps].0.combine(weight);
                        self.insert(
                            (eps.0, Some(symbol), q),
                            w,
                            Provenance::EpsCombine { eps, base: edge },
                        );
                    }
                }
            }
        }
    }

    /// pre* saturation. Pop rules contribute their edge unconditionally; swap and push rules
    /// fire when the automaton contains a path matching their right-hand side.
    fn run_pre(&mut self, pda: &Pda<W>) {
        // rule indices keyed by the first state/symbol of the right-hand side
        let mut swap_to: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        let mut push_to: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (rid, rule) in pda.rules().iter().enumerate() {
            match rule.op {
                RuleOp::Pop => self.insert(
                    (rule.from, Some(rule.label), rule.to),
                    rule.weight,
                    Provenance::PreRule { rule: rid, mids: vec![] },
                ),
                RuleOp::Swap(l) => swap_to.entry((rule.to, l)).or_default().push(rid),
                RuleOp::Noop => swap_to.entry((rule.to, rule.label)).or_default().push(rid),
                RuleOp::Push(l) => push_to.entry((rule.to, l)).or_default().push(rid),
            }
        }
        // partially matched push rules: (mid-state, second symbol) -> (rule, first edge)
        let mut pending: HashMap<(usize, usize), Vec<(usize, EdgeKey)>> = HashMap::new();
        while let Some(Reverse((weight, edge))) = self.queue.pop() {
            if self.settled.contains_key(&edge) || self.best.get(&edge) != Some(&weight) {
                continue;
            }
            let prov = self.cand_prov.remove(&edge).expect("pending edge without provenance");
            self.settle(edge, weight, prov);
            let (s, symbol, d) = edge;
            let symbol = symbol.expect("pre* automata contain no epsilon edges");
            for rid in swap_to.get(&(s, symbol)).cloned().unwrap_or_default() {
                let rule = pda.rule(rid);
                self.insert(
                    (rule.from, Some(rule.label), d),
                    weight.combine(rule.weight),
                    Provenance::PreRule { rule: rid, mids: vec![edge] },
                );
            }
            for rid in push_to.get(&(s, symbol)).cloned().unwrap_or_default() {
                let rule = pda.rule(rid);
                pending.entry((d, rule.label)).or_default().push((rid, edge));
                let seconds: Vec<EdgeKey> = self.out[d]
                    .iter()
                    .copied()
                    .filter(|e| e.1 == Some(rule.label))
                    .collect();
                for second in seconds {
                    let w = weight.combine(self.settled[&second].0).combine(rule.weight);
                    self.insert(
                        (rule.from, Some(rule.label), second.2),
                        w,
                        Provenance::PreRule { rule: rid, mids: vec![edge, second] },
                    );
                }
            }
            for (rid, first) in pending.get(&(s, symbol)).cloned().unwrap_or_default() {
                if first == edge {
                    continue;
                }
                let rule = pda.rule(rid);
                let w = self.settled[&first].0.combine(weight).combine(rule.weight);
                self.insert(
                    (rule.from, Some(rule.label), d),
                    w,
                    Provenance::PreRule { rule: rid, mids: vec![first, edge] },
                );
            }
        }
    }

    fn finish(self) -> PAutomaton<W> {
        PAutomaton {
            num_control: self.num_control,
            num_states: self.num_states,
            settled: self.settled,
            out: self.out,
            finals: self.finals,
        }
    }
}

/// Searches the product of the automaton with the header constraint for an accepted
/// configuration, starting from any state in `starts`. Returns the start state, the automaton
/// path and its total weight, minimal by weight.
fn find_accepting_path<W: Weight>(
    auto: &PAutomaton<W>,
    pda: &Pda<W>,
    starts: &[usize],
    header: &Nfa,
) -> Option<(usize, Vec<EdgeKey>, W)> {
    type Node = (usize, usize);
    let mut dist: HashMap<Node, W> = HashMap::new();
    let mut parent: HashMap<Node, (Node, EdgeKey)> = HashMap::new();
    let mut origin: HashMap<Node, usize> = HashMap::new();
    let mut heap: BinaryHeap<Reverse<(W, Node)>> = BinaryHeap::new();
    for &start in starts {
        for s in header.initial_closure() {
            let node = (start, s);
            if dist.get(&node).map(|d| *d <= W::zero()).unwrap_or(false) {
                continue;
            }
            dist.insert(node, W::zero());
            origin.insert(node, start);
            heap.push(Reverse((W::zero(), node)));
        }
    }
    let mut settled: HashMap<Node, W> = HashMap::new();
    while let Some(Reverse((w, node))) = heap.pop() {
        if settled.contains_key(&node) || dist.get(&node) != Some(&w) {
            continue;
        }
        settled.insert(node, w);
        let (a, s) = node;
        if auto.is_final(a) && header.closure_accepting(s) {
            // reconstruct the path
            let mut path = Vec::new();
            let mut cur = node;
            while let Some((prev, edge)) = parent.get(&cur) {
                path.push(*edge);
                cur = *prev;
            }
            path.reverse();
            return Some((origin[&node], path, w));
        }
        let start = origin[&node];
        for &edge in auto.out_edges(a) {
            let ew = auto.weight(&edge);
            let total = w.combine(ew);
            let relax = |next: Node,
                             dist: &mut HashMap<Node, W>,
                             parent: &mut HashMap<Node, (Node, EdgeKey)>,
                             origin: &mut HashMap<Node, usize>,
                             heap: &mut BinaryHeap<Reverse<(W, Node)>>| {
                if settled.contains_key(&next) {
                    return;
                }
                if dist.get(&next).map(|d| *d <= total).unwrap_or(false) {
                    return;
                }
                dist.insert(next, total);
                parent.insert(next, (node, edge));
                origin.insert(next, start);
                heap.push(Reverse((total, next)));
            };
            match edge.1 {
                None => relax((edge.2, s), &mut dist, &mut parent, &mut origin, &mut heap),
                Some(sym) => {
                    let label = pda.label(sym);
                    for (guard, t) in header.closed_edges(s) {
                        if guard.matches(&label) {
                            relax((edge.2, t), &mut dist, &mut parent, &mut origin, &mut heap);
                        }
                    }
                }
            }
        }
    }
    None
}
