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

//! Input loaders living at the edge of the system: GML topologies from Topology Zoo, and
//! Juniper-style XML routing tables. The core only ever sees the validated [`Network`] they
//! produce.
//!
//! [`Network`]: crate::network::Network

pub mod gml;
pub mod juniper;

pub use gml::{parse_gml_file, parse_gml_str, GmlError};
pub use juniper::{parse_routing_file, parse_routing_str, parse_table, XmlTableError};
