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

//! Module defining routers and their interfaces.

use super::routing_table::RoutingTable;
use super::types::{InterfaceId, RouterId};

/// Geographic position of a router. Only used by external cost callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Great-circle distance to another coordinate in kilometers.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// One direction of a link: an interface owned by a router, paired with the interface at the
/// other end of the link. A self-paired interface models an `lsi.*` style loopback link.
#[derive(Debug, Clone)]
pub struct Interface {
    pub(crate) name: String,
    pub(crate) router: RouterId,
    pub(crate) pair: Option<InterfaceId>,
}

impl Interface {
    /// Name of the interface, unique within its router.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning router.
    pub fn router(&self) -> RouterId {
        self.router
    }

    /// The paired interface at the other end of the link, if the pairing was established.
    pub fn pair(&self) -> Option<InterfaceId> {
        self.pair
    }
}

/// A router of the network, owning its interfaces (by arena index) and its routing tables.
#[derive(Debug, Clone)]
pub struct Router {
    pub(crate) name: String,
    pub(crate) alt_names: Vec<String>,
    pub(crate) router_id: RouterId,
    pub(crate) is_null: bool,
    pub(crate) interfaces: Vec<InterfaceId>,
    pub(crate) tables: Vec<RoutingTable>,
    pub(crate) coordinate: Option<Coordinate>,
}

impl Router {
    pub(crate) fn new(name: String, router_id: RouterId, is_null: bool) -> Self {
        Self {
            name,
            alt_names: Vec::new(),
            router_id,
            is_null,
            interfaces: Vec::new(),
            tables: Vec::new(),
            coordinate: None,
        }
    }

    /// Primary name of the router.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ID of the router.
    pub fn router_id(&self) -> RouterId {
        self.router_id
    }

    /// Returns true for the distinguished null router.
    pub fn is_null(&self) -> bool {
        self.is_null
    }

    /// All interfaces owned by this router.
    pub fn interfaces(&self) -> &[InterfaceId] {
        &self.interfaces
    }

    /// All routing tables of this router.
    pub fn tables(&self) -> &[RoutingTable] {
        &self.tables
    }

    /// Geographic position, if known.
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    /// Registers an additional name for the router.
    pub fn add_name(&mut self, name: impl Into<String>) {
        self.alt_names.push(name.into());
    }

    /// Returns true if `name` is the primary or an alternative name of this router.
    pub fn has_name(&self, name: &str) -> bool {
        self.name == name || self.alt_names.iter().any(|n| n == name)
    }

    /// Adds a routing table to this router. If a table with the same name is already present,
    /// the two are merged (collecting overlap warnings); otherwise the table is appended.
    /// Returns `true` iff the merge emitted no warning.
    pub fn add_table(&mut self, table: RoutingTable, warnings: &mut Vec<String>) -> bool {
        let name = self.name.clone();
        if let Some(existing) = self.tables.iter_mut().find(|t| t.name() == table.name()) {
            existing.merge(table, &name, warnings)
        } else {
            self.tables.push(table);
            true
        }
    }
}
