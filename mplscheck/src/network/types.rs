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

//! Module containing all type definitions of the network model

use petgraph::prelude::*;
use petgraph::stable_graph::StableGraph;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

type IndexType = u32;

/// Router Identification (and index into the adjacency graph)
pub type RouterId = NodeIndex<IndexType>;

/// Interface Identification (index into the interface arena of the [`Network`](super::Network))
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct InterfaceId(pub usize);

impl InterfaceId {
    /// Returns the raw arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Adjacency graph of the network. Each edge represents one link, annotated with the two paired
/// interfaces at its endpoints.
pub type LinkGraph = StableGraph<(), (InterfaceId, InterfaceId), Undirected, IndexType>;

/// Header symbol carried on the packet stack, or used as a pattern inside routing-table entries
/// and query automata.
///
/// The ordering sorts more specific symbols first: a concrete MPLS label before the any-MPLS
/// wildcard, before the any-IP wildcard, before IP prefixes (longest prefix first).
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Label {
    /// Concrete MPLS label
    Mpls(u64),
    /// Any MPLS label
    AnyMpls,
    /// Any IP header
    AnyIp,
    /// IPv4 prefix (`mask` counts the fixed leading bits)
    Ip4 {
        /// network address
        value: u64,
        /// prefix length
        mask: u8,
    },
    /// IPv6 prefix (`mask` counts the fixed leading bits)
    Ip6 {
        /// network address
        value: u64,
        /// prefix length
        mask: u8,
    },
    /// Link symbol, used only inside path query automata
    Interface(InterfaceId),
    /// The absence of a header
    None,
}

impl Label {
    /// Returns true if `self`, interpreted as a pattern, matches the concrete label `other`.
    /// Concrete labels match themselves, `AnyMpls` matches every MPLS label, `AnyIp` matches
    /// every IP prefix, and IP patterns match by prefix inclusion.
    pub fn matches(&self, other: &Label) -> bool {
        match (self, other) {
            (Label::Mpls(a), Label::Mpls(b)) => a == b,
            (Label::AnyMpls, Label::Mpls(_)) | (Label::AnyMpls, Label::AnyMpls) => true,
            (Label::AnyIp, Label::Ip4 { .. })
            | (Label::AnyIp, Label::Ip6 { .. })
            | (Label::AnyIp, Label::AnyIp) => true,
            (Label::Ip4 { value: pv, mask: pm }, Label::Ip4 { value: v, mask: m }) => {
                m >= pm && prefix_eq(*pv, *v, *pm, 32)
            }
            (Label::Ip6 { value: pv, mask: pm }, Label::Ip6 { value: v, mask: m }) => {
                m >= pm && prefix_eq(*pv, *v, *pm, 64)
            }
            (Label::Interface(a), Label::Interface(b)) => a == b,
            (Label::None, Label::None) => true,
            _ => false,
        }
    }

    /// Returns true for labels that may appear on a packet stack (everything except interface
    /// symbols and [`Label::None`]).
    pub fn is_stack_symbol(&self) -> bool {
        !matches!(self, Label::Interface(_) | Label::None)
    }

    fn rank(&self) -> u8 {
        match self {
            Label::Mpls(_) => 0,
            Label::AnyMpls => 1,
            Label::AnyIp => 2,
            Label::Ip4 { .. } => 3,
            Label::Ip6 { .. } => 4,
            Label::Interface(_) => 5,
            Label::None => 6,
        }
    }
}

fn prefix_eq(a: u64, b: u64, mask: u8, width: u8) -> bool {
    if mask == 0 {
        return true;
    }
    let shift = width.saturating_sub(mask);
    (a >> shift) == (b >> shift)
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Label::Mpls(a), Label::Mpls(b)) => a.cmp(b),
            (Label::Ip4 { value: a, mask: am }, Label::Ip4 { value: b, mask: bm })
            | (Label::Ip6 { value: a, mask: am }, Label::Ip6 { value: b, mask: bm }) => {
                // longest prefix first
                bm.cmp(am).then(a.cmp(b))
            }
            (Label::Interface(a), Label::Interface(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Mpls(v) => write!(f, "{}", v),
            Label::AnyMpls => write!(f, "mpls"),
            Label::AnyIp => write!(f, "ip"),
            Label::Ip4 { value, mask } => write!(f, "ip4:{:x}/{}", value, mask),
            Label::Ip6 { value, mask } => write!(f, "ip6:{:x}/{}", value, mask),
            Label::Interface(i) => write!(f, "if{}", i.0),
            Label::None => write!(f, "none"),
        }
    }
}

/// Network Errors
#[derive(Error, Debug, PartialEq)]
pub enum NetworkError {
    /// Router name is not present in the network
    #[error("Router name was not found in the network: {0}")]
    DeviceNameNotFound(String),
    /// Router id is not present in the network
    #[error("Router was not found in the network: {0:?}")]
    DeviceNotFound(RouterId),
    /// Interface name is not present on the given router
    #[error("Interface {name} was not found on router {router}")]
    InterfaceNameNotFound {
        /// owning router name
        router: String,
        /// interface name looked up
        name: String,
    },
    /// An interface is missing its pairing
    #[error("Interface {0} is not paired with any other interface")]
    UnpairedInterface(String),
    /// Pairing is not symmetric
    #[error("Pairing of interface {0} is not symmetric")]
    AsymmetricPairing(String),
    /// A routing table contains two entries with the same key
    #[error("Nondeterministic routing table, dual matches on {label} for router {router}")]
    NondeterministicTable {
        /// owning router name
        router: String,
        /// duplicated top label
        label: String,
    },
    /// A forwarding-operation string could not be parsed
    #[error("Unexpected operation type \"{0}\"")]
    OpParse(String),
}
