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

//! Parses GML files from Topology Zoo into a [`Network`].
//!
//! Every GML node becomes a router (duplicate labels get a `_N` suffix, N counting from 1),
//! every edge becomes a link with one interface at each end, and every router additionally gets
//! an interface to the null router so that packets can enter and leave the network anywhere.
//! `Latitude`/`Longitude` fields are kept as router coordinates. Duplicate edges and
//! self-loop edges are ignored.

use crate::network::{Coordinate, Network, NetworkError};
use std::collections::HashMap;
use std::fs::read_to_string;
use thiserror::Error;

/// Parses a GML file from disk.
pub fn parse_gml_file(filename: impl AsRef<str>) -> Result<Network, GmlError> {
    parse_gml_str(&read_to_string(filename.as_ref())?)
}

/// Parses GML content and returns the resulting network.
pub fn parse_gml_str(gml: &str) -> Result<Network, GmlError> {
    let mut net = Network::new();

    let mut current_state = CurrentState::NotStarted;
    let mut used_labels: HashMap<String, usize> = HashMap::new();
    let mut node_lookup: HashMap<usize, crate::network::RouterId> = HashMap::new();

    for (i, line) in gml.lines().enumerate() {
        let line = line.trim();
        current_state = match current_state {
            CurrentState::NotStarted => {
                if line == "graph [" {
                    CurrentState::None
                } else {
                    return Err(GmlError::UnexpectedToken { line: i, content: String::from(line) });
                }
            }
            CurrentState::None => {
                if line == "node [" {
                    CurrentState::Node { id: None, name: None, latitude: None, longitude: None }
                } else if line == "edge [" {
                    CurrentState::Edge { source: None, target: None }
                } else {
                    CurrentState::None
                }
            }
            CurrentState::Node { id, name, latitude, longitude } => {
                if let Some(number) = line.strip_prefix("id ") {
                    let id: Option<usize> = Some(number.parse()?);
                    CurrentState::Node { id, name, latitude, longitude }
                } else if let Some(rest) = line.strip_prefix("label \"") {
                    let mut name =
                        rest.strip_suffix('"').unwrap_or(rest).replace(' ', "_").to_string();
                    // disambiguate repeated labels
                    let num_used = *used_labels.get(&name).unwrap_or(&0);
                    used_labels.insert(name.clone(), num_used + 1);
                    if num_used > 0 {
                        name.push_str(&format!("_{}", num_used));
                    }
                    CurrentState::Node { id, name: Some(name), latitude, longitude }
                } else if let Some(number) = line.strip_prefix("Latitude ") {
                    let latitude: Option<f64> = number.parse().ok();
                    CurrentState::Node { id, name, latitude, longitude }
                } else if let Some(number) = line.strip_prefix("Longitude ") {
                    let longitude: Option<f64> = number.parse().ok();
                    CurrentState::Node { id, name, latitude, longitude }
                } else if line == "]" {
                    let name = name.ok_or(GmlError::NodeMissingLabel(i))?;
                    let router = net.add_router(name);
                    if let (Some(latitude), Some(longitude)) = (latitude, longitude) {
                        net.set_coordinate(router, Coordinate { latitude, longitude });
                    }
                    let id = id.ok_or(GmlError::NodeMissingId(i))?;
                    if node_lookup.contains_key(&id) {
                        return Err(GmlError::NodeIdNotUnique(i));
                    }
                    node_lookup.insert(id, router);
                    CurrentState::None
                } else {
                    CurrentState::Node { id, name, latitude, longitude }
                }
            }
            CurrentState::Edge { source, target } => {
                if let Some(number) = line.strip_prefix("source ") {
                    let source: Option<usize> = Some(number.parse()?);
                    CurrentState::Edge { source, target }
                } else if let Some(number) = line.strip_prefix("target ") {
                    let target: Option<usize> = Some(number.parse()?);
                    CurrentState::Edge { source, target }
                } else if line == "]" {
                    let source = source.ok_or(GmlError::EdgeMissingSource(i))?;
                    let source_id =
                        *node_lookup.get(&source).ok_or(GmlError::UnknownNodeId(source))?;
                    let target = target.ok_or(GmlError::EdgeMissingTarget(i))?;
                    let target_id =
                        *node_lookup.get(&target).ok_or(GmlError::UnknownNodeId(target))?;
                    let source_name = net.router(source_id).name().to_string();
                    let target_name = net.router(target_id).name().to_string();
                    if source_id != target_id
                        && net.find_interface(source_id, &format!("to_{}", target_name)).is_none()
                    {
                        let a = net.get_or_add_interface(source_id, format!("to_{}", target_name));
                        let b = net.get_or_add_interface(target_id, format!("to_{}", source_name));
                        net.pair_interfaces(a, b)?;
                    }
                    CurrentState::None
                } else {
                    CurrentState::Edge { source, target }
                }
            }
        };
    }

    for router in net.router_ids().collect::<Vec<_>>() {
        if !net.router(router).is_null() {
            net.add_null_interface(router)?;
        }
    }
    net.check_pairing()?;
    Ok(net)
}

enum CurrentState {
    NotStarted,
    None,
    Node { id: Option<usize>, name: Option<String>, latitude: Option<f64>, longitude: Option<f64> },
    Edge { source: Option<usize>, target: Option<usize> },
}

/// Errors while reading a GML topology
#[derive(Debug, Error)]
pub enum GmlError {
    /// Io Error
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    /// Unexpected Token
    #[error("Unexpected Token on line {line}: {content}")]
    UnexpectedToken {
        /// line number of the token
        line: usize,
        /// the offending line
        content: String,
    },
    /// ParseIntError
    #[error("Cannot parse an integer! {0}")]
    ParseIntError(#[from] std::num::ParseIntError),
    /// Unknown Node Id
    #[error("Unknown node id: {0}")]
    UnknownNodeId(usize),
    /// Node is missing an ID field
    #[error("Node is missing an ID field before line {0}!")]
    NodeMissingId(usize),
    /// Node is missing a label field
    #[error("Node is missing a label field before line {0}!")]
    NodeMissingLabel(usize),
    /// Duplicate Node Id
    #[error("Node ID is not unique on line {0}!")]
    NodeIdNotUnique(usize),
    /// Edge is missing the source field
    #[error("Edge is missing the source field before line {0}!")]
    EdgeMissingSource(usize),
    /// Edge is missing the target field
    #[error("Edge is missing the target field before line {0}!")]
    EdgeMissingTarget(usize),
    /// The constructed network is inconsistent
    #[error("Network Error: {0}")]
    Network(#[from] NetworkError),
}

#[cfg(test)]
mod test {
    use super::*;

    const SMALL_GML: &str = r#"graph [
  node [
    id 0
    label "Zurich"
    Latitude 47.36667
    Longitude 8.55
  ]
  node [
    id 1
    label "Geneva"
    Latitude 46.20222
    Longitude 6.14569
  ]
  node [
    id 2
    label "Zurich"
  ]
  edge [
    source 0
    target 1
  ]
  edge [
    source 1
    target 2
  ]
  edge [
    source 0
    target 1
  ]
]"#;

    #[test]
    fn small_graph() {
        let net = parse_gml_str(SMALL_GML).unwrap();
        // three routers plus the null router
        assert_eq!(net.num_routers(), 4);
        let zurich = net.get_router_id("Zurich").unwrap();
        let geneva = net.get_router_id("Geneva").unwrap();
        // the duplicate label got a suffix
        let zurich_1 = net.get_router_id("Zurich_1").unwrap();
        assert_ne!(zurich, zurich_1);
        // links are paired both ways
        let a = net.find_interface(zurich, "to_Geneva").unwrap();
        let b = net.find_interface(geneva, "to_Zurich").unwrap();
        assert_eq!(net.interface(a).pair(), Some(b));
        assert_eq!(net.interface(b).pair(), Some(a));
        // coordinates survive
        assert!(net.router(zurich).coordinate().is_some());
        assert!(net.router(zurich_1).coordinate().is_none());
        net.check_pairing().unwrap();
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            parse_gml_str("not a gml file"),
            Err(GmlError::UnexpectedToken { line: 0, .. })
        ));
    }
}
