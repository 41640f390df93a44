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

#![deny(missing_docs)]

//! # MplsCheck: Verifying MPLS Reachability Under Bounded Link Failures
//!
//! This is a library for verifying reachability and policy properties of MPLS (label-switched)
//! networks when up to k links may fail. Given a network topology, per-router MPLS forwarding
//! tables and a query constraining the initial header, the traversed path, the final header and
//! the failure bound, it decides whether some packet header and failure set exist such that the
//! packet traverses a matching path, and produces a trace when one does.
//!
//! ## Problem Statement
//!
//! Reachability under failures is reduced to reachability in a *pushdown system*: the PDA stack
//! is the MPLS label stack, the control states encode the position of the packet (router, path
//! automaton state, approximation counter). The resulting reachability problem is solved by
//! saturating a P-automaton with the standard pre* and post* algorithms, optionally searching
//! the shortest witness under additive weights.
//!
//! ## Structure
//!
//! - **[`network`]**: The network model: routers, interfaces, links, and per-router MPLS
//!   routing tables with weighted (failure-ranked) forwarding rules.
//!
//! - **[`query`]**: Queries and their regular constraints: three [`Nfa`](query::Nfa)s over
//!   labels (initial header, path, final header), the failure bound k, and the approximation
//!   mode, plus the parser for the one-query-per-line surface language.
//!
//! - **[`pda`]**: The per-query pipeline: the [factory](pda::NetworkPdaFactory) translating
//!   network and query into a weighted pushdown system, the [reducer](pda::reduce) pruning it,
//!   the [solver](pda::solver) saturating a P-automaton, and the trace lifting.
//!
//! - **[`verifier`]**: Orchestration: runs the approximation modes in order, stages
//!   compilation, reduction and verification with wall-clock timings, and collects one
//!   JSON-shaped [`QueryRecord`](verifier::QueryRecord) per query.
//!
//! - **[`topology`]**: Input loaders: Topology Zoo GML topologies and Juniper-style XML
//!   routing tables.
//!
//! ## Usage
//!
//! ```
//! use mplscheck::network::{Entry, Forward, ForwardKind, Label, Network, Op, RoutingTable};
//! use mplscheck::query::parse_query;
//! use mplscheck::verifier::{Outcome, Verifier};
//!
//! fn main() -> Result<(), mplscheck::Error> {
//!     // build a two-router network with a single swap rule
//!     let mut net = Network::new();
//!     let r0 = net.add_router("R0");
//!     let r1 = net.add_router("R1");
//!     let a = net.get_or_add_interface(r0, "to_R1");
//!     let b = net.get_or_add_interface(r1, "to_R0");
//!     net.pair_interfaces(a, b)?;
//!     net.add_null_interface(r0)?;
//!     net.add_null_interface(r1)?;
//!
//!     let mut table = RoutingTable::new("t");
//!     table.push_entry(Entry {
//!         ingoing: None,
//!         decreasing: false,
//!         top_label: Label::Mpls(42),
//!         forwards: vec![Forward {
//!             via: Some(a),
//!             kind: ForwardKind::Mpls,
//!             weight: 0,
//!             ops: vec![Op::Swap(Label::Mpls(43))],
//!         }],
//!     });
//!     table.sort("R0")?;
//!     net.add_table(r0, table, &mut Vec::new());
//!
//!     // verify a reachability query
//!     let query = parse_query("<42> [.#R0] .* [R1#.] <.> 0 EXACT", &net)?;
//!     let verifier = Verifier::new(1, 0)?;
//!     let record = verifier.run_once(&net, "Q1".to_string(), &query);
//!     assert_eq!(record.result, Outcome::Yes);
//!
//!     Ok(())
//! }
//! ```

// test modules
mod test;

mod error;
pub mod network;
pub mod pda;
pub mod query;
pub mod topology;
pub mod verifier;

pub use error::{Error, UsageError};
pub use network::Network;
pub use query::Query;
pub use verifier::{Engine, Outcome, QueryRecord, Verifier};
