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
use crate::network::Label;
use crate::query::{parse_queries, parse_query, ApproximationMode, QueryError};

#[test]
fn parse_two_hop_query() {
    let c = two_hop_network();
    let q = parse_query("<42> [.#R0] .* [R2#.] <> 0 EXACT", &c.net).unwrap();
    assert_eq!(q.failures, 0);
    assert_eq!(q.approximation, ApproximationMode::Exact);

    assert!(q.initial_header.accepts(&[Label::Mpls(42)]));
    assert!(!q.initial_header.accepts(&[Label::Mpls(43)]));
    assert!(!q.initial_header.accepts(&[]));

    assert!(q.final_header.accepts(&[]));
    assert!(!q.final_header.accepts(&[Label::Mpls(42)]));
}

#[test]
fn path_automaton_matches_the_link_sequence() {
    let c = two_hop_network();
    let q = parse_query("<42> [.#R0] .* [R2#.] <> 0 EXACT", &c.net).unwrap();

    let entry_link = {
        // the null-router side of R0's outside link
        let own = c.net.null_interfaces(c.routers[0])[0];
        c.net.interface(own).pair().unwrap()
    };
    let exit_link = c.net.null_interfaces(c.routers[2])[0];

    let word = vec![
        Label::Interface(entry_link),
        Label::Interface(c.fw[0]),
        Label::Interface(c.fw[1]),
        Label::Interface(exit_link),
    ];
    assert!(q.path.accepts(&word));

    // entering at R1 instead of R0 does not match
    let wrong = vec![Label::Interface(c.fw[0]), Label::Interface(c.fw[1]), Label::Interface(exit_link)];
    assert!(!q.path.accepts(&wrong));
}

#[test]
fn negated_link_patterns() {
    let c = two_hop_network();
    let q = parse_query("<.> [^R0#R1]+ <.> 0 OVER", &c.net).unwrap();
    assert!(!q.path.accepts(&[Label::Interface(c.fw[0])]));
    assert!(q.path.accepts(&[Label::Interface(c.fw[1])]));
    assert!(q.path.accepts(&[Label::Interface(c.fw[1]), Label::Interface(c.fw[1])]));
}

#[test]
fn header_regex_combinators() {
    let c = chain(2);
    let q = parse_query("<42|43> . <(42 43)*> 0 UNDER", &c.net).unwrap();
    assert!(q.initial_header.accepts(&[Label::Mpls(42)]));
    assert!(q.initial_header.accepts(&[Label::Mpls(43)]));
    assert!(!q.initial_header.accepts(&[Label::Mpls(44)]));

    assert!(q.final_header.accepts(&[]));
    assert!(q.final_header.accepts(&[Label::Mpls(42), Label::Mpls(43)]));
    assert!(q.final_header.accepts(&[
        Label::Mpls(42),
        Label::Mpls(43),
        Label::Mpls(42),
        Label::Mpls(43)
    ]));
    assert!(!q.final_header.accepts(&[Label::Mpls(42)]));
}

#[test]
fn wildcard_header_accepts_any_label() {
    let c = chain(2);
    let q = parse_query("<.> . <.*> 2 DUAL", &c.net).unwrap();
    assert_eq!(q.failures, 2);
    assert_eq!(q.approximation, ApproximationMode::Dual);
    assert!(q.initial_header.accepts(&[Label::Mpls(301568)]));
    assert!(!q.initial_header.accepts(&[]));
    assert!(q.final_header.accepts(&[]));
    assert!(q.final_header.accepts(&[Label::Mpls(1), Label::Mpls(2), Label::Mpls(3)]));
}

#[test]
fn unknown_router_is_rejected() {
    let c = chain(2);
    assert_eq!(
        parse_query("<.> [.#R7] <.> 0 OVER", &c.net),
        Err(QueryError::UnknownRouter("R7".to_string()))
    );
}

#[test]
fn malformed_queries_are_rejected() {
    let c = chain(2);
    assert!(matches!(parse_query("<.> . <.>", &c.net), Err(QueryError::Parse { .. })));
    assert!(matches!(parse_query("<.> . <.> 0 SOMETIMES", &c.net), Err(QueryError::Parse { .. })));
    assert!(matches!(parse_query("<.> <.> 0 OVER", &c.net), Err(QueryError::Parse { .. })));
    assert!(matches!(parse_query("<.> . <.> 0 OVER garbage", &c.net), Err(QueryError::Parse { .. })));
}

#[test]
fn query_files_keep_per_line_results() {
    let c = two_hop_network();
    let text = "# a comment\n<42> [.#R0] .* [R2#.] <> 0 EXACT\n\n<42> [.#R9] <> 0 EXACT\n";
    let parsed = parse_queries(text, &c.net);
    assert_eq!(parsed.len(), 2);
    assert!(parsed[0].1.is_ok());
    assert!(parsed[1].1.is_err());
}
