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
use crate::network::{Network, NetworkError};

#[test]
fn pairing_is_symmetric() {
    let c = chain(3);
    for id in c.net.interface_ids() {
        let pair = c.net.interface(id).pair().expect("all interfaces are paired");
        assert_eq!(c.net.interface(pair).pair(), Some(id));
    }
}

#[test]
fn router_lookup_by_any_name() {
    let mut net = Network::new();
    let r0 = net.add_router("edge-zurich");
    net.router_mut(r0).add_name("zrh1");
    assert_eq!(net.get_router_id("edge-zurich").unwrap(), r0);
    assert_eq!(net.get_router_id("zrh1").unwrap(), r0);
    assert_eq!(
        net.get_router_id("missing"),
        Err(NetworkError::DeviceNameNotFound("missing".to_string()))
    );
}

#[test]
fn null_interfaces_lead_outside() {
    let c = chain(2);
    let nulls = c.net.null_interfaces(c.routers[0]);
    assert_eq!(nulls.len(), 1);
    assert_eq!(c.net.link_target(nulls[0]), Some(c.net.null_router()));
    // the chain link does not lead to the null router
    assert_eq!(c.net.link_target(c.fw[0]), Some(c.routers[1]));
}

#[test]
fn self_pairing_loops_back() {
    let mut net = Network::new();
    let r0 = net.add_router("R0");
    let lsi = net.get_or_add_interface(r0, "lsi.0");
    net.pair_interfaces(lsi, lsi).unwrap();
    assert_eq!(net.link_target(lsi), Some(r0));
    net.check_pairing().unwrap();
}

#[test]
fn repairing_with_a_different_partner_fails() {
    let mut net = Network::new();
    let r0 = net.add_router("R0");
    let r1 = net.add_router("R1");
    let a = net.get_or_add_interface(r0, "a");
    let b = net.get_or_add_interface(r1, "b");
    let c = net.get_or_add_interface(r1, "c");
    net.pair_interfaces(a, b).unwrap();
    assert!(matches!(net.pair_interfaces(a, c), Err(NetworkError::AsymmetricPairing(_))));
}

#[test]
fn dangling_interfaces_are_paired_to_null() {
    let mut net = Network::new();
    let r0 = net.add_router("R0");
    let dangling = net.get_or_add_interface(r0, "ge-0/0/0");
    assert!(net.check_pairing().is_err());
    net.pair_unpaired_to_null().unwrap();
    net.check_pairing().unwrap();
    assert_eq!(net.link_target(dangling), Some(net.null_router()));
}

#[test]
fn interface_names_are_unique_per_router() {
    let mut net = Network::new();
    let r0 = net.add_router("R0");
    let a = net.get_or_add_interface(r0, "eth0");
    let again = net.get_or_add_interface(r0, "eth0");
    assert_eq!(a, again);
    assert_eq!(net.router(r0).interfaces().len(), 1);
}
