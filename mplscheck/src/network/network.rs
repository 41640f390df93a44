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

//! # Top-level Network module
//!
//! The network is an arena of routers and interfaces. Routers live as nodes of a stable
//! adjacency graph, interfaces in a flat arena indexed by [`InterfaceId`]. A link is a pair of
//! interfaces, stored symmetrically; the distinguished null router represents everything
//! outside of the network. After loading, the network is immutable and shared read-only by all
//! queries.

use super::router::{Coordinate, Interface, Router};
use super::routing_table::RoutingTable;
use super::types::{InterfaceId, LinkGraph, NetworkError, RouterId};
use log::debug;
use std::collections::HashMap;

/// The network topology: routers, interfaces and their pairing.
#[derive(Debug, Clone)]
pub struct Network {
    graph: LinkGraph,
    routers: HashMap<RouterId, Router>,
    interfaces: Vec<Interface>,
    names: HashMap<String, RouterId>,
    null_router: RouterId,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Name of the distinguished null router.
    pub const NULL_NAME: &'static str = "NULL";

    /// Generates an empty network containing only the null router.
    pub fn new() -> Self {
        let mut graph = LinkGraph::default();
        let null_router = graph.add_node(());
        let mut routers = HashMap::new();
        routers.insert(
            null_router,
            Router::new(Self::NULL_NAME.to_string(), null_router, true),
        );
        let mut names = HashMap::new();
        names.insert(Self::NULL_NAME.to_string(), null_router);
        Self { graph, routers, interfaces: Vec::new(), names, null_router }
    }

    /// Adds a new router to the network.
    pub fn add_router(&mut self, name: impl Into<String>) -> RouterId {
        let name: String = name.into();
        let id = self.graph.add_node(());
        self.routers.insert(id, Router::new(name.clone(), id, false));
        self.names.insert(name, id);
        id
    }

    /// The ID of the null router.
    pub fn null_router(&self) -> RouterId {
        self.null_router
    }

    /// Looks up a router by any of its names.
    pub fn get_router_id(&self, name: impl AsRef<str>) -> Result<RouterId, NetworkError> {
        let name = name.as_ref();
        if let Some(id) = self.names.get(name) {
            return Ok(*id);
        }
        self.router_ids()
            .find(|id| self.router(*id).has_name(name))
            .ok_or_else(|| NetworkError::DeviceNameNotFound(name.to_string()))
    }

    /// Returns the router behind the given ID.
    ///
    /// # Panics
    /// Panics if the ID was not created by this network; such an ID is an internal bug.
    pub fn router(&self, id: RouterId) -> &Router {
        self.routers.get(&id).expect("router id not part of this network")
    }

    /// Mutable access to a router, available only during the load phase.
    pub fn router_mut(&mut self, id: RouterId) -> &mut Router {
        self.routers.get_mut(&id).expect("router id not part of this network")
    }

    /// All router IDs in creation order (the null router first).
    pub fn router_ids(&self) -> impl Iterator<Item = RouterId> + '_ {
        self.graph.node_indices()
    }

    /// Number of routers, including the null router.
    pub fn num_routers(&self) -> usize {
        self.routers.len()
    }

    /// Returns the interface behind the given ID.
    pub fn interface(&self, id: InterfaceId) -> &Interface {
        &self.interfaces[id.0]
    }

    /// All interface IDs in creation order.
    pub fn interface_ids(&self) -> impl Iterator<Item = InterfaceId> {
        (0..self.interfaces.len()).map(InterfaceId)
    }

    /// Finds an interface of a router by name.
    pub fn find_interface(&self, router: RouterId, name: &str) -> Option<InterfaceId> {
        self.router(router)
            .interfaces
            .iter()
            .copied()
            .find(|i| self.interfaces[i.0].name == name)
    }

    /// Returns the named interface of the router, creating it if it does not exist yet.
    pub fn get_or_add_interface(&mut self, router: RouterId, name: impl AsRef<str>) -> InterfaceId {
        let name = name.as_ref();
        if let Some(id) = self.find_interface(router, name) {
            return id;
        }
        let id = InterfaceId(self.interfaces.len());
        self.interfaces.push(Interface { name: name.to_string(), router, pair: None });
        self.router_mut(router).interfaces.push(id);
        id
    }

    /// Pairs two interfaces into a link (symmetric). Pairing an interface with itself models a
    /// self-looping `lsi.*` interface. Re-pairing an interface with a different partner is an
    /// error.
    pub fn pair_interfaces(&mut self, a: InterfaceId, b: InterfaceId) -> Result<(), NetworkError> {
        for (x, y) in [(a, b), (b, a)] {
            match self.interfaces[x.0].pair {
                None => self.interfaces[x.0].pair = Some(y),
                Some(p) if p == y => {}
                Some(_) => {
                    return Err(NetworkError::AsymmetricPairing(self.interface_full_name(x)))
                }
            }
        }
        let (ra, rb) = (self.interfaces[a.0].router, self.interfaces[b.0].router);
        if self.graph.find_edge(ra, rb).is_none() {
            self.graph.add_edge(ra, rb, (a, b));
        }
        Ok(())
    }

    /// Adds an interface leading to the null router (and its counterpart on the null router),
    /// making the router an entry and exit point of the network.
    pub fn add_null_interface(&mut self, router: RouterId) -> Result<InterfaceId, NetworkError> {
        let router_name = self.router(router).name().to_string();
        let own = self.get_or_add_interface(router, "null0");
        let other = self.get_or_add_interface(self.null_router, &router_name);
        self.pair_interfaces(own, other)?;
        Ok(own)
    }

    /// All interfaces of the router whose pairing leads to the null router.
    pub fn null_interfaces(&self, router: RouterId) -> Vec<InterfaceId> {
        self.router(router)
            .interfaces
            .iter()
            .copied()
            .filter(|i| {
                self.interfaces[i.0]
                    .pair
                    .map(|p| self.interfaces[p.0].router == self.null_router)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Adds a routing table to the router, merging with an existing table of the same name.
    /// Overlap warnings are appended to `warnings`. Returns `true` iff no warning was emitted.
    pub fn add_table(
        &mut self,
        router: RouterId,
        table: RoutingTable,
        warnings: &mut Vec<String>,
    ) -> bool {
        self.router_mut(router).add_table(table, warnings)
    }

    /// Sets the geographic position of a router.
    pub fn set_coordinate(&mut self, router: RouterId, coordinate: Coordinate) {
        self.router_mut(router).coordinate = Some(coordinate);
    }

    /// Pairs every so-far unpaired interface with a fresh interface on the null router. Loaders
    /// call this once at the end, so that interfaces only referenced by routing tables lead out
    /// of the network.
    pub fn pair_unpaired_to_null(&mut self) -> Result<(), NetworkError> {
        for id in self.interface_ids().collect::<Vec<_>>() {
            if self.interfaces[id.0].pair.is_some() {
                continue;
            }
            let owner = self.interfaces[id.0].router;
            if owner == self.null_router {
                // a dangling interface on the null router loops back to itself
                self.pair_interfaces(id, id)?;
                continue;
            }
            debug!("pairing dangling interface {} to the null router", self.interface_full_name(id));
            let owner_name = self.router(owner).name().to_string();
            let iface_name = self.interfaces[id.0].name.clone();
            let other = self
                .get_or_add_interface(self.null_router, format!("{}.{}", owner_name, iface_name));
            self.pair_interfaces(id, other)?;
        }
        Ok(())
    }

    /// Verifies the pairing invariant: every interface is paired, and pairing is symmetric.
    pub fn check_pairing(&self) -> Result<(), NetworkError> {
        for id in self.interface_ids() {
            let pair = self.interfaces[id.0]
                .pair
                .ok_or_else(|| NetworkError::UnpairedInterface(self.interface_full_name(id)))?;
            let back = self.interfaces[pair.0].pair;
            if back != Some(id) {
                return Err(NetworkError::AsymmetricPairing(self.interface_full_name(id)));
            }
        }
        Ok(())
    }

    /// Human-readable `router.interface` name, used in diagnostics.
    pub fn interface_full_name(&self, id: InterfaceId) -> String {
        let iface = &self.interfaces[id.0];
        format!("{}.{}", self.router(iface.router).name(), iface.name)
    }

    /// The router reached by crossing the link of the given interface, if it is paired.
    pub fn link_target(&self, id: InterfaceId) -> Option<RouterId> {
        self.interfaces[id.0].pair.map(|p| self.interfaces[p.0].router)
    }
}
