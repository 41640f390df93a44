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

//! Module containing all error types

use crate::network::NetworkError;
use crate::query::QueryError;
use crate::topology::{GmlError, XmlTableError};
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error propagated from the network model
    #[error("Network Error: {0}")]
    Network(#[from] NetworkError),
    /// Error propagated from query parsing
    #[error("Query Error: {0}")]
    Query(#[from] QueryError),
    /// Invalid engine, reduction or weight setting
    #[error("Usage Error: {0}")]
    Usage(#[from] UsageError),
    /// Error while reading a GML topology
    #[error("Topology Error: {0}")]
    Gml(#[from] GmlError),
    /// Error while reading an XML routing table
    #[error("Routing Table Error: {0}")]
    Xml(#[from] XmlTableError),
}

/// Errors caused by invalid settings
#[derive(Debug, Error, PartialEq)]
pub enum UsageError {
    /// The engine must be 0 (none), 1 (post*) or 2 (pre*)
    #[error("Unknown value for engine: {0} (expected 0, 1 or 2)")]
    BadEngine(usize),
    /// The reduction level must be between 0 and 4
    #[error("Unknown value for tos-reduction: {0} (expected 0 to 4)")]
    BadReduction(usize),
    /// Shortest-trace verification only works with the post* engine
    #[error("Shortest traces using weights are only implemented for engine 1 (post*), not for engine {0}")]
    WeightedEngine(usize),
}
