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

//! Shared network fixtures for the test modules.

use crate::network::{
    Entry, Forward, ForwardKind, InterfaceId, Label, Network, Op, RouterId, RoutingTable,
};

/// Adds a bidirectional link between two routers, with interfaces named after the peer.
pub fn link(net: &mut Network, a: RouterId, b: RouterId) -> (InterfaceId, InterfaceId) {
    let name_a = net.router(a).name().to_string();
    let name_b = net.router(b).name().to_string();
    let ia = net.get_or_add_interface(a, format!("to_{}", name_b));
    let ib = net.get_or_add_interface(b, format!("to_{}", name_a));
    net.pair_interfaces(ia, ib).unwrap();
    (ia, ib)
}

/// An entry matching the MPLS label on any ingress.
pub fn entry(top: u64, forwards: Vec<Forward>) -> Entry {
    Entry { ingoing: None, decreasing: false, top_label: Label::Mpls(top), forwards }
}

/// A regular MPLS forwarding rule.
pub fn fwd(via: InterfaceId, weight: u32, ops: Vec<Op>) -> Forward {
    Forward { via: Some(via), kind: ForwardKind::Mpls, weight, ops }
}

/// Installs a single sorted routing table named `t` on the router.
pub fn set_table(net: &mut Network, router: RouterId, entries: Vec<Entry>) {
    let mut table = RoutingTable::new("t");
    for e in entries {
        table.push_entry(e);
    }
    let name = net.router(router).name().to_string();
    table.sort(&name).unwrap();
    net.add_table(router, table, &mut Vec::new());
}

/// A chain network `R0 - R1 - ... - R(n-1)`, every router with an interface to the outside.
pub struct Chain {
    /// the network
    pub net: Network,
    /// routers in chain order
    pub routers: Vec<RouterId>,
    /// forward interfaces: `fw[i]` leads from `routers[i]` to `routers[i+1]`
    pub fw: Vec<InterfaceId>,
}

/// Builds a chain of `n` routers without any routing tables.
pub fn chain(n: usize) -> Chain {
    let mut net = Network::new();
    let routers: Vec<RouterId> = (0..n).map(|i| net.add_router(format!("R{}", i))).collect();
    let mut fw = Vec::new();
    for i in 0..n - 1 {
        let (a, _) = link(&mut net, routers[i], routers[i + 1]);
        fw.push(a);
    }
    for &r in &routers {
        net.add_null_interface(r).unwrap();
    }
    net.check_pairing().unwrap();
    Chain { net, routers, fw }
}

/// Two-hop scenario: R0 swaps 42 to 43 towards R1, R1 pops towards R2.
pub fn two_hop_network() -> Chain {
    let mut c = chain(3);
    set_table(
        &mut c.net,
        c.routers[0],
        vec![entry(42, vec![fwd(c.fw[0], 0, vec![Op::Swap(Label::Mpls(43))])])],
    );
    set_table(&mut c.net, c.routers[1], vec![entry(43, vec![fwd(c.fw[1], 0, vec![Op::Pop])])]);
    c
}

/// Two-hop scenario plus a direct backup link R0 - R2 used when the R0 - R1 link fails. The
/// returned interface is the R0 side of the backup link.
pub fn failover_network() -> (Chain, InterfaceId) {
    let mut c = chain(3);
    let (direct, _) = link(&mut c.net, c.routers[0], c.routers[2]);
    set_table(
        &mut c.net,
        c.routers[0],
        vec![entry(
            42,
            vec![
                fwd(c.fw[0], 0, vec![Op::Swap(Label::Mpls(43))]),
                fwd(direct, 1, vec![Op::Push(Label::Mpls(99)), Op::Swap(Label::Mpls(43))]),
            ],
        )],
    );
    set_table(&mut c.net, c.routers[1], vec![entry(43, vec![fwd(c.fw[1], 0, vec![Op::Pop])])]);
    (c, direct)
}

/// A chain where both hops only work through their rank-1 backup rule; the primaries point to
/// dead-end stub routers. Realising the path R0 - R1 - R2 therefore needs two distinct link
/// failures.
pub fn double_failure_network() -> Chain {
    let mut c = chain(3);
    let stub_a = c.net.add_router("S0");
    let stub_b = c.net.add_router("S1");
    let (to_stub_a, _) = link(&mut c.net, c.routers[0], stub_a);
    let (to_stub_b, _) = link(&mut c.net, c.routers[1], stub_b);
    c.net.add_null_interface(stub_a).unwrap();
    c.net.add_null_interface(stub_b).unwrap();
    set_table(
        &mut c.net,
        c.routers[0],
        vec![entry(
            42,
            vec![
                fwd(to_stub_a, 0, vec![Op::Swap(Label::Mpls(43))]),
                fwd(c.fw[0], 1, vec![Op::Swap(Label::Mpls(43))]),
            ],
        )],
    );
    set_table(
        &mut c.net,
        c.routers[1],
        vec![entry(
            43,
            vec![fwd(to_stub_b, 0, vec![Op::Swap(Label::Mpls(44))]), fwd(c.fw[1], 1, vec![Op::Pop])],
        )],
    );
    c
}

/// A diamond `R0 - {R1, R2} - R3`, both branches forwarding label 42 to R3 with a pop at the
/// middle router. Used for shortest-trace tests.
pub fn diamond_network() -> (Chain, InterfaceId, InterfaceId) {
    let mut net = Network::new();
    let routers: Vec<RouterId> = (0..4).map(|i| net.add_router(format!("R{}", i))).collect();
    let (up, _) = link(&mut net, routers[0], routers[1]);
    let (down, _) = link(&mut net, routers[0], routers[2]);
    let (up_out, _) = link(&mut net, routers[1], routers[3]);
    let (down_out, _) = link(&mut net, routers[2], routers[3]);
    for &r in &routers {
        net.add_null_interface(r).unwrap();
    }
    net.check_pairing().unwrap();
    set_table(
        &mut net,
        routers[0],
        vec![entry(
            42,
            vec![
                fwd(up, 0, vec![Op::Swap(Label::Mpls(43))]),
                fwd(down, 0, vec![Op::Swap(Label::Mpls(44))]),
            ],
        )],
    );
    set_table(&mut net, routers[1], vec![entry(43, vec![fwd(up_out, 0, vec![Op::Pop])])]);
    set_table(&mut net, routers[2], vec![entry(44, vec![fwd(down_out, 0, vec![Op::Pop])])]);
    (Chain { net, routers, fw: vec![] }, up, down)
}
