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

//! Loader for Juniper-style XML routing tables.
//!
//! Routing tables are nested under per-router `<routes for="...">` elements; each
//! `<route-table>` holds `<rt-entry>` elements with a `<rt-destination>` (a decimal label,
//! optionally suffixed `(S=0)`, the ignored word `default`, or an interface name) and `<nh>`
//! next hops. A `<nh-type>` is one of `unilist`, `unicast`, `discard`, `receive`,
//! `table lookup`, `indirect` (resolved through a caller-supplied map keyed by `<nh-index>`),
//! or an operation string such as `Swap 17, Push 3 (top)`. `<via>` names the outgoing
//! interface; a `lsi.`-prefixed via self-pairs. Structural errors are fatal; overlaps between
//! tables of the same router are collected as warnings and the rule lists concatenated.

use crate::network::{
    Entry, Forward, ForwardKind, Label, Network, NetworkError, RouterId, RoutingTable,
};
use log::warn;
use std::collections::HashMap;
use std::fs::read_to_string;
use thiserror::Error;
use xmltree::Element;

/// Parses a routing file from disk into the (already loaded) network. Returns the collected
/// overlap warnings.
pub fn parse_routing_file(
    filename: impl AsRef<str>,
    net: &mut Network,
    indirect: &HashMap<String, String>,
) -> Result<Vec<String>, XmlTableError> {
    parse_routing_str(&read_to_string(filename.as_ref())?, net, indirect)
}

/// Parses routing XML content into the network. Returns the collected overlap warnings.
pub fn parse_routing_str(
    content: &str,
    net: &mut Network,
    indirect: &HashMap<String, String>,
) -> Result<Vec<String>, XmlTableError> {
    let root = Element::parse(content.as_bytes())?;
    let mut warnings = Vec::new();
    for routes in children(&root, "routes") {
        let router_name =
            routes.attributes.get("for").ok_or(XmlTableError::MissingElement("routes[for]"))?;
        let router = net.get_router_id(router_name)?;
        for table_elem in children(routes, "route-table") {
            let table = parse_table(table_elem, router, net, indirect)?;
            net.add_table(router, table, &mut warnings);
        }
    }
    net.pair_unpaired_to_null()?;
    net.check_pairing()?;
    Ok(warnings)
}

/// Parses one `<route-table>` element into a routing table of the given router.
pub fn parse_table(
    elem: &Element,
    router: RouterId,
    net: &mut Network,
    indirect: &HashMap<String, String>,
) -> Result<RoutingTable, XmlTableError> {
    let name = child_text(elem, "table-name").unwrap_or_default();
    if let Some(family) = child_text(elem, "address-family") {
        if family != "MPLS" {
            return Err(XmlTableError::NotMpls(name));
        }
    }
    let mut table = RoutingTable::new(name.clone());
    let entries: Vec<&Element> = children(elem, "rt-entry").collect();
    if entries.is_empty() {
        return Err(XmlTableError::NoEntries(name));
    }
    for rt_entry in entries {
        let destination = child_text(rt_entry, "rt-destination")
            .ok_or(XmlTableError::MissingElement("rt-destination"))?;
        let mut destination = destination.trim().to_string();
        let mut decreasing = false;
        if let Some(pos) = destination.find("(S=0)") {
            if pos + 5 != destination.len() {
                return Err(XmlTableError::BadBottomMarker(name));
            }
            decreasing = true;
            destination = destination[..pos].trim_end().to_string();
        }
        let (ingoing, top_label) = if destination.chars().all(|c| c.is_ascii_digit())
            && !destination.is_empty()
        {
            let value = destination.parse::<u64>().map_err(|_| XmlTableError::BadLabel(destination.clone()))?;
            (None, Label::Mpls(value))
        } else if destination == "default" {
            // these are ignored
            continue;
        } else {
            (Some(net.get_or_add_interface(router, &destination)), Label::AnyIp)
        };

        let mut entry = Entry { ingoing, decreasing, top_label, forwards: Vec::new() };
        let nhs: Vec<&Element> = children(rt_entry, "nh").collect();
        if nhs.is_empty() {
            return Err(XmlTableError::MissingNh(name));
        }
        let mut cast = false;
        for nh in nhs {
            let weight = parse_weight(nh)?;
            let mut kind = ForwardKind::Mpls;
            let mut ops = Vec::new();
            let mut skipvia = true;
            let mut nh_index = None;
            let nh_type = child_text(nh, "nh-type");
            match nh_type.as_deref() {
                Some("unilist") => {
                    if cast {
                        return Err(XmlTableError::NestedCast(name));
                    }
                    cast = true;
                    continue;
                }
                Some("discard") => kind = ForwardKind::Discard,
                Some("receive") => kind = ForwardKind::Receive,
                Some("table lookup") => kind = ForwardKind::Ip,
                Some("indirect") => {
                    skipvia = false;
                    nh_index =
                        Some(child_text(nh, "nh-index").ok_or(XmlTableError::MissingElement("nh-index"))?);
                }
                Some("unicast") => skipvia = false,
                Some(opstr) => {
                    ops = RoutingTable::parse_ops(opstr)?;
                    skipvia = false;
                }
                None => {}
            }
            let mut via = None;
            if let Some(via_name) = child_text(nh, "via").filter(|v| !v.is_empty()) {
                if skipvia {
                    let msg = format!(
                        "found via \"{}\" in \"{}\" but got type expecting no via: {}",
                        via_name,
                        name,
                        nh_type.as_deref().unwrap_or("")
                    );
                    warn!("{}", msg);
                }
                via = Some(parse_via(net, router, &via_name)?);
            } else if let Some(index) = nh_index {
                let target = indirect
                    .get(&index)
                    .ok_or_else(|| XmlTableError::MissingIndirect(index.clone()))?;
                via = Some(net.get_or_add_interface(router, target));
            }
            entry.forwards.push(Forward { via, kind, weight, ops });
        }
        entry.compact_weights();
        table.push_entry(entry);
    }
    let router_name = net.router(router).name().to_string();
    table.sort(&router_name)?;
    Ok(table)
}

/// Resolves a `<via>` value: everything after the first space is dropped, and a `lsi.` prefix
/// denotes a self-looping interface.
fn parse_via(net: &mut Network, router: RouterId, via: &str) -> Result<crate::network::InterfaceId, XmlTableError> {
    let name = via.split_whitespace().next().unwrap_or(via);
    let id = net.get_or_add_interface(router, name);
    if name.starts_with("lsi.") && net.interface(id).pair().is_none() {
        net.pair_interfaces(id, id)?;
    }
    Ok(id)
}

fn parse_weight(nh: &Element) -> Result<u32, XmlTableError> {
    let Some(text) = child_text(nh, "nh-weight") else { return Ok(0) };
    let parsed = if let Some(hex) = text.strip_prefix("0x") {
        u32::from_str_radix(hex, 16)
    } else {
        text.parse::<u32>()
    };
    parsed.map_err(|_| XmlTableError::BadWeight(text))
}

fn children<'a>(elem: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
    elem.children.iter().filter_map(|n| n.as_element()).filter(move |e| e.name == name)
}

fn child_text(elem: &Element, name: &str) -> Option<String> {
    elem.get_child(name).and_then(|c| c.get_text()).map(|t| t.trim().to_string())
}

/// Errors while reading an XML routing table
#[derive(Debug, Error)]
pub enum XmlTableError {
    /// Malformed XML
    #[error("XML Error: {0}")]
    Xml(#[from] xmltree::ParseError),
    /// Io Error
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    /// The table is not of the MPLS address family
    #[error("Not MPLS-type address-family routing-table (\"{0}\")")]
    NotMpls(String),
    /// The table holds no entries
    #[error("No entries in routing-table \"{0}\"")]
    NoEntries(String),
    /// A required element is missing
    #[error("Expected element <{0}>")]
    MissingElement(&'static str),
    /// The `(S=0)` marker may only appear at the end of the destination
    #[error("Expect only (S=0) notation as postfix of <rt-destination> in table {0}")]
    BadBottomMarker(String),
    /// An entry has no next hops
    #[error("No \"nh\" entries in routing-table \"{0}\"")]
    MissingNh(String),
    /// Two `unilist` markers in the same entry
    #[error("Already in cast in routing-table \"{0}\"")]
    NestedCast(String),
    /// An indirect next hop could not be resolved
    #[error("Could not lookup indirect: {0}")]
    MissingIndirect(String),
    /// A label is not a number
    #[error("Invalid label \"{0}\"")]
    BadLabel(String),
    /// A next-hop weight is not a number
    #[error("Invalid next-hop weight \"{0}\"")]
    BadWeight(String),
    /// The table is structurally invalid
    #[error("Network Error: {0}")]
    Network(#[from] NetworkError),
}
