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

//! # Pushdown reachability
//!
//! Per-query machinery: the [`factory`] translates the network and the query into a weighted
//! pushdown system ([`pds`]), the [`reducer`] prunes it, the [`solver`] saturates a P-automaton
//! with pre* or post*, and [`trace`] lifts a saturated witness back into a network trace. All
//! of it is owned by the running query and discarded with it.

pub mod factory;
pub mod pds;
pub mod reducer;
pub mod solver;
pub mod trace;

pub use factory::NetworkPdaFactory;
pub use pds::{Pda, Rule, RuleOp, Weight};
pub use reducer::reduce;
pub use solver::{post_star, pre_star, PAutomaton, SolveResult};
pub use trace::{Trace, TraceState, TraceStep};
