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

//! Parser for the surface query language, one query per line:
//!
//! ```text
//! <initial-header> path-regex <final-header> k MODE
//! ```
//!
//! Header regex atoms are decimal MPLS labels and `.`; path atoms are `[src#dst]` link patterns
//! (router names, `.` wildcards, `^` negation) and `.`; both support `|`, `*`, `+`, `?` and
//! parentheses. `<>` denotes the empty header. Link patterns are resolved against the network at
//! parse time, so the network must be fully loaded and paired first.

use super::nfa::{Guard, Nfa};
use super::{ApproximationMode, Query, QueryError};
use crate::network::{Label, Network};

/// Parses one query line against the given network.
pub fn parse_query(line: &str, net: &Network) -> Result<Query, QueryError> {
    let mut p = Parser { chars: line.chars().collect(), pos: 0, net };
    let initial_header = p.parse_header()?;
    let path = p.parse_regex(RegexKind::Path)?;
    let final_header = p.parse_header()?;
    let failures = p.parse_number()? as usize;
    let approximation = p.parse_mode()?;
    p.skip_ws();
    if !p.at_end() {
        return Err(p.error("trailing input after the approximation mode"));
    }
    Ok(Query { initial_header, path, final_header, failures, approximation })
}

/// Parses a whole query file: one query per line, empty lines and lines starting with `#` or
/// `//` are skipped. Each kept line yields its original text together with the parse result, so
/// that a malformed query only fails its own record.
pub fn parse_queries(text: &str, net: &Network) -> Vec<(String, Result<Query, QueryError>)> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with("//"))
        .map(|l| (l.to_string(), parse_query(l, net)))
        .collect()
}

#[derive(Clone, Copy, PartialEq)]
enum RegexKind {
    Header,
    Path,
}

struct Parser<'n> {
    chars: Vec<char>,
    pos: usize,
    net: &'n Network,
}

impl<'n> Parser<'n> {
    fn error(&self, msg: impl Into<String>) -> QueryError {
        QueryError::Parse { pos: self.pos, msg: msg.into() }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, c: char) -> Result<(), QueryError> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c)))
        }
    }

    fn parse_header(&mut self) -> Result<Nfa, QueryError> {
        self.skip_ws();
        self.expect('<')?;
        self.skip_ws();
        if self.peek() == Some('>') {
            self.pos += 1;
            return Ok(Nfa::empty());
        }
        let nfa = self.parse_regex(RegexKind::Header)?;
        self.skip_ws();
        self.expect('>')?;
        Ok(nfa)
    }

    fn parse_regex(&mut self, kind: RegexKind) -> Result<Nfa, QueryError> {
        let mut alt = self.parse_seq(kind)?;
        loop {
            self.skip_ws();
            if self.peek() == Some('|') {
                self.pos += 1;
                alt = alt.union(self.parse_seq(kind)?);
            } else {
                return Ok(alt);
            }
        }
    }

    fn parse_seq(&mut self, kind: RegexKind) -> Result<Nfa, QueryError> {
        let mut seq: Option<Nfa> = None;
        loop {
            self.skip_ws();
            match self.peek() {
                None | Some('>') | Some(')') | Some('|') => break,
                Some('<') if kind == RegexKind::Path => break,
                _ => {
                    let factor = self.parse_factor(kind)?;
                    seq = Some(match seq {
                        None => factor,
                        Some(s) => s.concat(factor),
                    });
                }
            }
        }
        seq.ok_or_else(|| self.error("expected a regular expression"))
    }

    fn parse_factor(&mut self, kind: RegexKind) -> Result<Nfa, QueryError> {
        let mut nfa = self.parse_atom(kind)?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    nfa = nfa.star();
                }
                Some('+') => {
                    self.pos += 1;
                    nfa = nfa.plus();
                }
                Some('?') => {
                    self.pos += 1;
                    nfa = nfa.optional();
                }
                _ => return Ok(nfa),
            }
        }
    }

    fn parse_atom(&mut self, kind: RegexKind) -> Result<Nfa, QueryError> {
        self.skip_ws();
        match self.peek() {
            Some('.') => {
                self.pos += 1;
                Ok(Nfa::symbol(Guard::wildcard()))
            }
            Some('(') => {
                self.pos += 1;
                let inner = self.parse_regex(kind)?;
                self.skip_ws();
                self.expect(')')?;
                Ok(inner)
            }
            Some('[') if kind == RegexKind::Path => {
                self.pos += 1;
                let guard = self.parse_link_pattern()?;
                self.expect(']')?;
                Ok(Nfa::symbol(guard))
            }
            Some(c) if kind == RegexKind::Header && c.is_ascii_digit() => {
                let value = self.parse_number()?;
                Ok(Nfa::symbol(Guard::of(vec![Label::Mpls(value)])))
            }
            _ => Err(self.error("expected a regular expression atom")),
        }
    }

    fn parse_number(&mut self) -> Result<u64, QueryError> {
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a number"));
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits.parse().map_err(|_| self.error("number out of range"))
    }

    fn parse_mode(&mut self) -> Result<ApproximationMode, QueryError> {
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "OVER" => Ok(ApproximationMode::Over),
            "UNDER" => Ok(ApproximationMode::Under),
            "DUAL" => Ok(ApproximationMode::Dual),
            "EXACT" => Ok(ApproximationMode::Exact),
            _ => Err(self.error(format!("unknown approximation mode \"{}\"", word))),
        }
    }

    /// Parses the inside of a `[src#dst]` link pattern and resolves it to the set of matching
    /// link symbols.
    fn parse_link_pattern(&mut self) -> Result<Guard, QueryError> {
        let negated = if self.peek() == Some('^') {
            self.pos += 1;
            true
        } else {
            false
        };
        let src = self.parse_side('#')?;
        self.expect('#')?;
        let dst = self.parse_side(']')?;
        let labels = self.resolve_links(&src, &dst)?;
        Ok(if negated { Guard::not(labels) } else { Guard::of(labels) })
    }

    fn parse_side(&mut self, stop: char) -> Result<String, QueryError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c != stop && c != ']') {
            self.pos += 1;
        }
        let side: String = self.chars[start..self.pos].iter().collect::<String>().trim().to_string();
        if side.is_empty() {
            Err(self.error("expected a router name or '.'"))
        } else {
            Ok(side)
        }
    }

    /// The set of link symbols whose source router matches `src` and whose target router
    /// matches `dst` (a link symbol is the egress interface of the crossed link).
    fn resolve_links(&self, src: &str, dst: &str) -> Result<Vec<Label>, QueryError> {
        for side in [src, dst] {
            if side != "." && self.net.get_router_id(side).is_err() {
                return Err(QueryError::UnknownRouter(side.to_string()));
            }
        }
        let mut labels = Vec::new();
        for id in self.net.interface_ids() {
            let iface = self.net.interface(id);
            let Some(target) = self.net.link_target(id) else { continue };
            let src_ok = src == "." || self.net.router(iface.router()).has_name(src);
            let dst_ok = dst == "." || self.net.router(target).has_name(dst);
            if src_ok && dst_ok {
                labels.push(Label::Interface(id));
            }
        }
        Ok(labels)
    }
}
