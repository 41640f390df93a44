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

use super::fixtures::*;
use crate::network::{Entry, Forward, ForwardKind, Label, NetworkError, Op, RoutingTable};

#[test]
fn parse_ops_sequences() {
    assert_eq!(
        RoutingTable::parse_ops("Swap 17, Push 3, Pop, Swap 9 (top)").unwrap(),
        vec![
            Op::Swap(Label::Mpls(17)),
            Op::Push(Label::Mpls(3)),
            Op::Pop,
            Op::Swap(Label::Mpls(9)),
        ]
    );
    assert_eq!(RoutingTable::parse_ops("Pop").unwrap(), vec![Op::Pop]);
    assert_eq!(RoutingTable::parse_ops("Swap 301568").unwrap(), vec![Op::Swap(Label::Mpls(301568))]);
}

#[test]
fn parse_ops_rejects_malformed_input() {
    assert!(matches!(RoutingTable::parse_ops("Frobnicate 1"), Err(NetworkError::OpParse(_))));
    assert!(matches!(RoutingTable::parse_ops("Swap"), Err(NetworkError::OpParse(_))));
    assert!(matches!(RoutingTable::parse_ops("Pop 3"), Err(NetworkError::OpParse(_))));
    // the (top) qualifier must be the suffix
    assert!(matches!(RoutingTable::parse_ops("Swap 1 (top), Pop"), Err(NetworkError::OpParse(_))));
}

fn discard_entry(top: u64) -> Entry {
    Entry {
        ingoing: None,
        decreasing: false,
        top_label: Label::Mpls(top),
        forwards: vec![Forward { via: None, kind: ForwardKind::Discard, weight: 0, ops: vec![] }],
    }
}

#[test]
fn sort_rejects_duplicate_mpls_entries() {
    let c = chain(2);
    let mut table = RoutingTable::new("t");
    table.push_entry(entry(5, vec![fwd(c.fw[0], 0, vec![Op::Pop])]));
    table.push_entry(entry(5, vec![fwd(c.fw[0], 0, vec![Op::Swap(Label::Mpls(6))])]));
    assert!(matches!(
        table.sort("R0"),
        Err(NetworkError::NondeterministicTable { .. })
    ));
}

#[test]
fn sort_deduplicates_identical_non_mpls_entries() {
    let mut table = RoutingTable::new("t");
    table.push_entry(discard_entry(5));
    table.push_entry(discard_entry(5));
    table.sort("R0").unwrap();
    assert_eq!(table.entries().len(), 1);
}

#[test]
fn bottom_of_stack_is_a_distinct_key() {
    let c = chain(2);
    let mut table = RoutingTable::new("t");
    table.push_entry(entry(5, vec![fwd(c.fw[0], 0, vec![Op::Pop])]));
    let mut bottom = entry(5, vec![fwd(c.fw[0], 0, vec![Op::Swap(Label::Mpls(6))])]);
    bottom.decreasing = true;
    table.push_entry(bottom);
    table.sort("R0").unwrap();
    assert_eq!(table.entries().len(), 2);
}

#[test]
fn merge_concatenates_on_overlap() {
    let c = chain(2);
    let mut a = RoutingTable::new("t");
    a.push_entry(entry(5, vec![fwd(c.fw[0], 0, vec![Op::Pop])]));
    a.sort("R0").unwrap();
    let mut b = RoutingTable::new("t");
    b.push_entry(entry(5, vec![fwd(c.fw[0], 0, vec![Op::Swap(Label::Mpls(6))])]));
    b.sort("R0").unwrap();

    let mut warnings = Vec::new();
    let all_fine = a.merge(b, "R0", &mut warnings);
    assert!(!all_fine);
    assert_eq!(warnings.len(), 1);
    assert_eq!(a.entries().len(), 1);
    assert_eq!(a.entries()[0].forwards.len(), 2);
}

#[test]
fn merge_deduplicates_identical_non_mpls_rules() {
    let mut a = RoutingTable::new("t");
    a.push_entry(discard_entry(5));
    a.sort("R0").unwrap();
    let mut b = RoutingTable::new("t");
    b.push_entry(discard_entry(5));
    b.sort("R0").unwrap();

    let mut warnings = Vec::new();
    assert!(a.merge(b, "R0", &mut warnings));
    assert!(warnings.is_empty());
    assert_eq!(a.entries()[0].forwards.len(), 1);
}

#[test]
fn merge_interleaves_disjoint_entries() {
    let c = chain(2);
    let mut a = RoutingTable::new("t");
    a.push_entry(entry(1, vec![fwd(c.fw[0], 0, vec![Op::Pop])]));
    a.push_entry(entry(5, vec![fwd(c.fw[0], 0, vec![Op::Pop])]));
    a.sort("R0").unwrap();
    let mut b = RoutingTable::new("t");
    b.push_entry(entry(3, vec![fwd(c.fw[0], 0, vec![Op::Pop])]));
    b.push_entry(entry(9, vec![fwd(c.fw[0], 0, vec![Op::Pop])]));
    b.sort("R0").unwrap();

    let mut warnings = Vec::new();
    assert!(a.merge(b, "R0", &mut warnings));
    let labels: Vec<Label> = a.entries().iter().map(|e| e.top_label).collect();
    assert_eq!(labels, vec![Label::Mpls(1), Label::Mpls(3), Label::Mpls(5), Label::Mpls(9)]);
}

#[test]
fn weights_are_compacted_to_dense_ranks() {
    let c = chain(2);
    let mut e = entry(
        5,
        vec![
            fwd(c.fw[0], 0x10, vec![Op::Pop]),
            fwd(c.fw[0], 0x1, vec![Op::Pop]),
            fwd(c.fw[0], 0x10, vec![Op::Pop]),
        ],
    );
    e.compact_weights();
    assert_eq!(e.forwards.iter().map(|f| f.weight).collect::<Vec<_>>(), vec![1, 0, 1]);
}

#[test]
fn matching_is_most_specific_first() {
    let c = chain(2);
    let mut table = RoutingTable::new("t");
    let mut any_mpls = entry(0, vec![fwd(c.fw[0], 0, vec![Op::Pop])]);
    any_mpls.top_label = Label::AnyMpls;
    table.push_entry(any_mpls);
    table.push_entry(entry(5, vec![fwd(c.fw[0], 0, vec![Op::Swap(Label::Mpls(6))])]));
    table.sort("R0").unwrap();

    let hits = table.matching_entries(None, &Label::Mpls(5));
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].top_label, Label::Mpls(5));
    assert_eq!(hits[1].top_label, Label::AnyMpls);

    // a label without an exact entry only matches the wildcard
    let hits = table.matching_entries(None, &Label::Mpls(7));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].top_label, Label::AnyMpls);
}

#[test]
fn matching_respects_the_ingress_restriction() {
    let c = chain(3);
    let mut restricted = entry(5, vec![fwd(c.fw[0], 0, vec![Op::Pop])]);
    restricted.ingoing = Some(c.fw[1]);
    let mut table = RoutingTable::new("t");
    table.push_entry(restricted);
    table.sort("R0").unwrap();

    assert_eq!(table.matching_entries(Some(c.fw[1]), &Label::Mpls(5)).len(), 1);
    assert_eq!(table.matching_entries(Some(c.fw[0]), &Label::Mpls(5)).len(), 0);
    assert_eq!(table.matching_entries(None, &Label::Mpls(5)).len(), 0);
}
