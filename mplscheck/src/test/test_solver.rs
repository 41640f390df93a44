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

//! Saturation tests on hand-built pushdown systems.

use crate::network::Label;
use crate::pda::{post_star, pre_star, Pda, Rule, RuleOp, Weight};
use crate::query::{ApproximationMode, Guard, Nfa, Query};

fn label(v: u64) -> Label {
    Label::Mpls(v)
}

fn symbol(v: u64) -> Nfa {
    Nfa::symbol(Guard::of(vec![label(v)]))
}

fn query(initial: Nfa, final_header: Nfa) -> Query {
    Query {
        initial_header: initial,
        path: Nfa::empty(),
        final_header,
        failures: 0,
        approximation: ApproximationMode::Exact,
    }
}

fn rule<W: Weight>(from: usize, l: usize, op: RuleOp, to: usize, weight: W) -> Rule<W> {
    Rule { from, label: l, op, to, weight, origin: 0 }
}

#[test]
fn swap_reaches_the_accepting_state() {
    // <0, A> -> <1, B>
    let pda = Pda::new(
        vec![label(1), label(2)],
        2,
        vec![rule(0, 0, RuleOp::Swap(1), 1, ())],
        vec![0],
        vec![1],
    );
    let q = query(symbol(1), symbol(2));

    let post = post_star(&pda, &q);
    assert!(post.non_empty);
    let trace = post.trace.unwrap();
    assert_eq!(trace.states.len(), 2);
    assert_eq!(trace.states[0].state, 0);
    assert_eq!(trace.states[0].stack, vec![0]);
    assert_eq!(trace.states[1].state, 1);
    assert_eq!(trace.states[1].stack, vec![1]);
    assert_eq!(trace.rules, vec![0]);

    let pre = pre_star(&pda, &q);
    assert!(pre.non_empty);
    assert_eq!(pre.trace.unwrap().states, trace.states);
}

#[test]
fn mismatching_final_header_is_empty() {
    let pda = Pda::new(
        vec![label(1), label(2)],
        2,
        vec![rule(0, 0, RuleOp::Swap(1), 1, ())],
        vec![0],
        vec![1],
    );
    // the accepting state is only ever reached with B on the stack
    let q = query(symbol(1), symbol(1));
    assert!(!post_star(&pda, &q).non_empty);
    assert!(!pre_star(&pda, &q).non_empty);
}

#[test]
fn push_then_pop_restores_the_stack() {
    // <0, A> -> <1, B A>; <1, B> -> <2, eps>
    let pda = Pda::new(
        vec![label(1), label(2)],
        3,
        vec![rule(0, 0, RuleOp::Push(1), 1, ()), rule(1, 1, RuleOp::Pop, 2, ())],
        vec![0],
        vec![2],
    );
    let q = query(symbol(1), symbol(1));

    for result in [post_star(&pda, &q), pre_star(&pda, &q)] {
        assert!(result.non_empty);
        let trace = result.trace.unwrap();
        assert_eq!(trace.states.len(), 3);
        assert_eq!(trace.states[1].stack, vec![1, 0]);
        assert_eq!(trace.states[2].state, 2);
        assert_eq!(trace.states[2].stack, vec![0]);
        assert_eq!(trace.rules, vec![0, 1]);
    }
}

#[test]
fn pop_to_the_empty_stack() {
    // <0, A> -> <1, eps>, accepted with the empty final header
    let pda = Pda::new(vec![label(1)], 2, vec![rule(0, 0, RuleOp::Pop, 1, ())], vec![0], vec![1]);
    let q = query(symbol(1), Nfa::empty());

    for result in [post_star(&pda, &q), pre_star(&pda, &q)] {
        assert!(result.non_empty);
        let trace = result.trace.unwrap();
        assert_eq!(trace.states.last().unwrap().state, 1);
        assert!(trace.states.last().unwrap().stack.is_empty());
    }
}

#[test]
fn saturation_terminates_on_loops() {
    // a self loop that keeps swapping A to A never reaches state 1
    let pda = Pda::new(
        vec![label(1), label(2)],
        2,
        vec![rule(0, 0, RuleOp::Swap(0), 0, ()), rule(0, 1, RuleOp::Swap(1), 1, ())],
        vec![0],
        vec![1],
    );
    let q = query(symbol(1), symbol(2));
    assert!(!post_star(&pda, &q).non_empty);
    assert!(!pre_star(&pda, &q).non_empty);
}

#[test]
fn noop_rules_keep_the_top() {
    let pda = Pda::new(
        vec![label(1)],
        2,
        vec![rule(0, 0, RuleOp::Noop, 1, ())],
        vec![0],
        vec![1],
    );
    let q = query(symbol(1), symbol(1));
    for result in [post_star(&pda, &q), pre_star(&pda, &q)] {
        assert!(result.non_empty);
        let trace = result.trace.unwrap();
        assert_eq!(trace.states[1].stack, vec![0]);
    }
}

#[test]
fn shortest_trace_takes_the_cheaper_path() {
    // two derivations into state 1: directly (cost 10) or through state 2 (cost 3 + 4)
    let pda = Pda::new(
        vec![label(1), label(2), label(3)],
        3,
        vec![
            rule(0, 0, RuleOp::Swap(1), 1, 10u32),
            rule(0, 0, RuleOp::Swap(2), 2, 3u32),
            rule(2, 2, RuleOp::Swap(1), 1, 4u32),
        ],
        vec![0],
        vec![1],
    );
    let q = query(symbol(1), symbol(2));
    let result = post_star(&pda, &q);
    assert!(result.non_empty);
    let trace = result.trace.unwrap();
    assert_eq!(trace.weight, 7);
    // the witness goes through state 2
    assert_eq!(trace.states.iter().map(|s| s.state).collect::<Vec<_>>(), vec![0, 2, 1]);
    assert_eq!(trace.rules, vec![1, 2]);
}

#[test]
fn deep_stacks_through_nested_pushes() {
    // push twice, then pop twice
    let pda = Pda::new(
        vec![label(1), label(2)],
        5,
        vec![
            rule(0, 0, RuleOp::Push(1), 1, ()),
            rule(1, 1, RuleOp::Push(1), 2, ()),
            rule(2, 1, RuleOp::Pop, 3, ()),
            rule(3, 1, RuleOp::Pop, 4, ()),
        ],
        vec![0],
        vec![4],
    );
    let q = query(symbol(1), symbol(1));
    for result in [post_star(&pda, &q), pre_star(&pda, &q)] {
        assert!(result.non_empty);
        let trace = result.trace.unwrap();
        assert_eq!(trace.states.len(), 5);
        assert_eq!(trace.states[2].stack, vec![1, 1, 0]);
        assert_eq!(trace.states[4].stack, vec![0]);
    }
}
