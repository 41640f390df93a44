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

//! # Reachability queries
//!
//! A query constrains the initial header, the traversed path, the final header, the number of
//! tolerated link failures, and the approximation mode. The three regular constraints are kept
//! as separate [`Nfa`]s: the two header automata range over stack labels, the path automaton
//! over link symbols ([`Label::Interface`](crate::network::Label)).

pub mod nfa;
pub mod parser;

pub use nfa::{Guard, Nfa};
pub use parser::{parse_queries, parse_query};

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// How the bounded-failure semantics is approximated in the pushdown translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApproximationMode {
    /// Sound NO, possibly spurious YES
    Over,
    /// Sound YES, possibly spurious NO
    Under,
    /// First OVER, then UNDER if the first run is inconclusive
    Dual,
    /// Single precise encoding
    Exact,
}

impl fmt::Display for ApproximationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Over => write!(f, "OVER"),
            Self::Under => write!(f, "UNDER"),
            Self::Dual => write!(f, "DUAL"),
            Self::Exact => write!(f, "EXACT"),
        }
    }
}

/// A parsed reachability query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Regular constraint on the initial label stack
    pub initial_header: Nfa,
    /// Regular constraint on the traversed path (over link symbols)
    pub path: Nfa,
    /// Regular constraint on the final label stack
    pub final_header: Nfa,
    /// Maximum number of link failures the adversary may pick
    pub failures: usize,
    /// Approximation mode
    pub approximation: ApproximationMode,
}

/// Query Errors
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    /// The query string is malformed
    #[error("Parse error at position {pos}: {msg}")]
    Parse {
        /// character offset into the query string
        pos: usize,
        /// what went wrong
        msg: String,
    },
    /// A link pattern references a router that does not exist
    #[error("Unknown router in link pattern: {0}")]
    UnknownRouter(String),
}
