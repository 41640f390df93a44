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

//! Module defining per-router MPLS routing tables.
//!
//! A table holds a sorted list of [`Entry`]s, keyed by the optional ingress interface, the
//! bottom-of-stack flag and the top-label pattern. Each entry carries an ordered list of
//! [`Forward`] rules; the rule weights are failure ranks (0 = primary, 1 = first backup, ...),
//! compacted to a dense range per entry.

use super::types::{InterfaceId, Label, NetworkError};
use log::warn;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// A single stack operation of a forwarding rule, applied to the top of the label stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Push the label on top of the stack
    Push(Label),
    /// Replace the top of the stack with the label
    Swap(Label),
    /// Remove the top of the stack
    Pop,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Push(l) => write!(f, "push {}", l),
            Op::Swap(l) => write!(f, "swap {}", l),
            Op::Pop => write!(f, "pop"),
        }
    }
}

/// The kind of a forwarding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForwardKind {
    /// Regular MPLS forwarding
    Mpls,
    /// The packet leaves MPLS forwarding and continues with an IP route / table lookup
    Ip,
    /// The packet is delivered to the router itself
    Receive,
    /// The packet is dropped
    Discard,
}

/// One forwarding rule of a routing-table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forward {
    /// Outgoing interface, if the rule moves the packet
    pub via: Option<InterfaceId>,
    /// Kind of the rule
    pub kind: ForwardKind,
    /// Failure rank of the rule within its entry (0 = primary)
    pub weight: u32,
    /// Stack operations applied in order
    pub ops: Vec<Op>,
}

/// One routing-table entry: the match key plus its ordered forwarding rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Restrict the entry to packets arriving on this interface
    pub ingoing: Option<InterfaceId>,
    /// The bottom-of-stack variant of the top label (the `(S=0)` marker)
    pub decreasing: bool,
    /// Pattern matched against the top of the label stack
    pub top_label: Label,
    /// Forwarding rules, ordered as loaded
    pub forwards: Vec<Forward>,
}

impl Entry {
    /// The sorting and identity key of the entry.
    fn key(&self) -> (Option<InterfaceId>, bool, Label) {
        (self.ingoing, self.decreasing, self.top_label)
    }

    fn key_cmp(&self, other: &Entry) -> Ordering {
        self.key().cmp(&other.key())
    }

    fn same_key(&self, other: &Entry) -> bool {
        self.key() == other.key()
    }

    /// Compacts the forwarding-rule weights of this entry to a dense `0..n` rank.
    pub fn compact_weights(&mut self) {
        let distinct: BTreeSet<u32> = self.forwards.iter().map(|f| f.weight).collect();
        for f in self.forwards.iter_mut() {
            // position of the old weight among all distinct weights
            f.weight = distinct.range(..f.weight).count() as u32;
        }
    }
}

/// A per-router MPLS routing table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingTable {
    name: String,
    entries: Vec<Entry>,
}

impl RoutingTable {
    /// Creates an empty table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), entries: Vec::new() }
    }

    /// Name of the table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All entries in sorted order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Appends an entry. The caller must [`sort`](Self::sort) the table before using it.
    pub fn push_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Sorts the entries by their key and verifies that the table is deterministic. Two entries
    /// with the same key are only tolerated if both carry exactly one identical non-MPLS rule
    /// each; they are then deduplicated. Everything else is a fatal load error.
    pub fn sort(&mut self, router: &str) -> Result<(), NetworkError> {
        self.entries.sort_by(Entry::key_cmp);
        let mut i = 1;
        while i < self.entries.len() {
            if self.entries[i - 1].same_key(&self.entries[i]) {
                if mergeable_duplicate(&self.entries[i - 1], &self.entries[i]) {
                    self.entries.remove(i);
                    continue;
                }
                return Err(NetworkError::NondeterministicTable {
                    router: router.to_string(),
                    label: self.entries[i].top_label.to_string(),
                });
            }
            i += 1;
        }
        Ok(())
    }

    /// Merges `other` into this table. Both tables must be sorted. On an equal-key collision,
    /// two single identical non-MPLS rules are deduplicated silently; any other collision emits
    /// an overlap warning and concatenates the rule lists. Returns `true` iff no warning was
    /// emitted.
    pub fn merge(&mut self, other: RoutingTable, router: &str, warnings: &mut Vec<String>) -> bool {
        let mut all_fine = true;
        for e in other.entries {
            match self.entries.binary_search_by(|probe| probe.key_cmp(&e)) {
                Ok(pos) => {
                    if mergeable_duplicate(&self.entries[pos], &e) {
                        continue;
                    }
                    let msg = format!(
                        "Overlap on label {} for router {}",
                        e.top_label, router
                    );
                    warn!("{}", msg);
                    warnings.push(msg);
                    all_fine = false;
                    self.entries[pos].forwards.extend(e.forwards);
                }
                Err(pos) => self.entries.insert(pos, e),
            }
        }
        debug_assert!(self.entries.windows(2).all(|w| w[0].key() <= w[1].key()));
        all_fine
    }

    /// Returns the entries matching a packet that arrived on `ingress` with `top` as the top of
    /// its label stack, most specific label first.
    pub fn matching_entries(&self, ingress: Option<InterfaceId>, top: &Label) -> Vec<&Entry> {
        let mut hits: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|e| e.ingoing.is_none() || e.ingoing == ingress)
            .filter(|e| e.top_label.matches(top))
            .collect();
        hits.sort_by_key(|e| (e.top_label, !e.decreasing));
        hits
    }

    /// Parses an operation string such as `"Swap 17, Push 3, Pop"`. A trailing `(top)`
    /// qualifier is stripped; anywhere else it is an error, as is any unknown keyword.
    pub fn parse_ops(ops: &str) -> Result<Vec<Op>, NetworkError> {
        let mut s = ops.trim();
        if let Some(pos) = s.find("(top)") {
            if pos + 5 != s.len() {
                return Err(NetworkError::OpParse(ops.to_string()));
            }
            s = s[..pos].trim_end();
        }
        let mut parsed = Vec::new();
        for tok in s.split(',') {
            let tok = tok.trim();
            if tok.is_empty() {
                continue;
            }
            if let Some(rest) = tok.strip_prefix("Swap") {
                parsed.push(Op::Swap(Label::Mpls(parse_label(rest, tok)?)));
            } else if let Some(rest) = tok.strip_prefix("Push") {
                parsed.push(Op::Push(Label::Mpls(parse_label(rest, tok)?)));
            } else if let Some(rest) = tok.strip_prefix("Pop") {
                if !rest.trim().is_empty() {
                    return Err(NetworkError::OpParse(tok.to_string()));
                }
                parsed.push(Op::Pop);
            } else {
                return Err(NetworkError::OpParse(tok.to_string()));
            }
        }
        Ok(parsed)
    }
}

fn parse_label(rest: &str, tok: &str) -> Result<u64, NetworkError> {
    rest.trim()
        .parse::<u64>()
        .map_err(|_| NetworkError::OpParse(tok.to_string()))
}

fn mergeable_duplicate(a: &Entry, b: &Entry) -> bool {
    a.forwards.len() == 1
        && b.forwards.len() == 1
        && a.forwards[0].kind == b.forwards[0].kind
        && a.forwards[0].kind != ForwardKind::Mpls
}
