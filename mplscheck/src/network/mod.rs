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

//! # Network model
//!
//! The model distinguishes routers, interfaces and routing tables. A link is a symmetric pair
//! of interfaces; the null router collects every link that leads outside of the network. Routing
//! tables map a `(ingress, bottom-of-stack, top-label)` key to an ordered list of weighted
//! forwarding rules, where the weight is the failure rank of the rule.
//!
//! Everything is immutable once loading has finished; per-query state lives in
//! [`pda`](crate::pda).

pub mod network;
pub mod router;
pub mod routing_table;
pub mod types;

pub use network::Network;
pub use router::{Coordinate, Interface, Router};
pub use routing_table::{Entry, Forward, ForwardKind, Op, RoutingTable};
pub use types::{InterfaceId, Label, LinkGraph, NetworkError, RouterId};
