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

//! # Verifier orchestration
//!
//! Runs the per-query pipeline: compile the PDA, reduce it, saturate, extract and concretise a
//! witness, and resolve the approximation mode into the final outcome. `DUAL` queries run the
//! pipeline with over-approximation first and fall back to under-approximation only when the
//! first run is inconclusive. Every stage is timed; the result of each query is collected in a
//! serialisable [`QueryRecord`].

use crate::error::UsageError;
use crate::network::{Entry, Forward, Network};
use crate::pda::{self, NetworkPdaFactory, TraceStep, Weight};
use crate::query::{ApproximationMode, Query};
use log::{debug, info};
use serde::Serialize;
use std::time::Instant;

/// Result of a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    /// A witness exists
    Yes,
    /// No witness exists
    No,
    /// The chosen approximation could not decide the query
    Maybe,
}

/// The saturation engine to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// No verification, only compilation and reduction
    None,
    /// Forward saturation from the initial configurations
    PostStar,
    /// Backward saturation from the accepting configurations
    PreStar,
}

impl Engine {
    /// Parses the numeric engine selector (0 = none, 1 = post*, 2 = pre*).
    pub fn from_id(id: usize) -> Result<Self, UsageError> {
        match id {
            0 => Ok(Self::None),
            1 => Ok(Self::PostStar),
            2 => Ok(Self::PreStar),
            _ => Err(UsageError::BadEngine(id)),
        }
    }

    /// The name used in the JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::PostStar => "Post*",
            Self::PreStar => "Pre*",
        }
    }

    fn id(&self) -> usize {
        match self {
            Self::None => 0,
            Self::PostStar => 1,
            Self::PreStar => 2,
        }
    }
}

/// The JSON-shaped record of one verified query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRecord {
    /// the original query string
    pub query: String,
    /// name of the engine used
    pub engine: &'static str,
    /// the mode that produced the result (for `DUAL`: the conclusive sub-mode)
    pub mode: ApproximationMode,
    /// rules kept and rules removed by the reduction
    pub reduction: (usize, usize),
    /// the verification outcome
    pub result: Outcome,
    /// the witness trace, if requested and found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<TraceStep>>,
    /// accumulated weight of the witness in shortest-trace mode
    #[serde(rename = "trace-weight", skip_serializing_if = "Option::is_none")]
    pub trace_weight: Option<Vec<u32>>,
    /// wall time of the PDA construction, in seconds
    #[serde(rename = "compilation-time", skip_serializing_if = "Option::is_none")]
    pub compilation_time: Option<f64>,
    /// wall time of the reduction, in seconds
    #[serde(rename = "reduction-time", skip_serializing_if = "Option::is_none")]
    pub reduction_time: Option<f64>,
    /// wall time of the saturation, in seconds
    #[serde(rename = "verification-time", skip_serializing_if = "Option::is_none")]
    pub verification_time: Option<f64>,
    /// diagnostic of a failed query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryRecord {
    fn new(query: String, engine: Engine, mode: ApproximationMode) -> Self {
        Self {
            query,
            engine: engine.name(),
            mode,
            reduction: (0, 0),
            result: Outcome::Maybe,
            trace: None,
            trace_weight: None,
            compilation_time: None,
            reduction_time: None,
            verification_time: None,
            error: None,
        }
    }

    /// A record for a query that failed before verification (e.g. a parse error).
    pub fn failed(query: String, error: String) -> Self {
        let mut r = Self::new(query, Engine::None, ApproximationMode::Over);
        r.error = Some(error);
        r
    }
}

/// The verifier: validated settings plus the per-query pipeline.
#[derive(Debug, Clone)]
pub struct Verifier {
    engine: Engine,
    reduction: usize,
    print_trace: bool,
    timing: bool,
}

impl Verifier {
    /// Creates a verifier, validating the engine and reduction selectors.
    pub fn new(engine: usize, reduction: usize) -> Result<Self, UsageError> {
        let engine = Engine::from_id(engine)?;
        if reduction > 4 {
            return Err(UsageError::BadReduction(reduction));
        }
        Ok(Self { engine, reduction, print_trace: false, timing: true })
    }

    /// Include the witness trace in the output records.
    pub fn set_print_trace(&mut self, print_trace: bool) {
        self.print_trace = print_trace;
    }

    /// Include the stage timings in the output records.
    pub fn set_timing(&mut self, timing: bool) {
        self.timing = timing;
    }

    /// Shortest-trace verification requires the post* engine.
    pub fn check_supports_weight(&self) -> Result<(), UsageError> {
        if self.engine != Engine::PostStar {
            return Err(UsageError::WeightedEngine(self.engine.id()));
        }
        Ok(())
    }

    /// Runs all queries in order, one record each.
    pub fn run(&self, net: &Network, queries: &[(String, Query)]) -> Vec<QueryRecord> {
        queries
            .iter()
            .enumerate()
            .map(|(i, (text, q))| {
                info!("verifying Q{}: {}", i + 1, text);
                self.run_once(net, text.clone(), q)
            })
            .collect()
    }

    /// Runs a single query without weights (any-trace mode).
    pub fn run_once(&self, net: &Network, text: String, query: &Query) -> QueryRecord {
        self.run_generic::<(), _>(net, text, query, &|_, _, _| ())
    }

    /// Runs a single query in shortest-trace mode, annotating every routing rule with the
    /// weight callback. Fails unless the engine is post*.
    pub fn run_once_shortest<F>(
        &self,
        net: &Network,
        text: String,
        query: &Query,
        weight: F,
    ) -> Result<QueryRecord, UsageError>
    where
        F: Fn(&Network, &Entry, &Forward) -> u32,
    {
        self.check_supports_weight()?;
        Ok(self.run_generic::<u32, _>(net, text, query, &weight))
    }

    fn run_generic<W, F>(&self, net: &Network, text: String, query: &Query, weight: &F) -> QueryRecord
    where
        W: Weight,
        F: Fn(&Network, &Entry, &Forward) -> W,
    {
        let mut record = QueryRecord::new(text, self.engine, query.approximation);
        let modes = match query.approximation {
            ApproximationMode::Dual => vec![ApproximationMode::Over, ApproximationMode::Under],
            m => vec![m],
        };
        let mut compilation_time = 0.0;
        let mut reduction_time = 0.0;
        let mut verification_time = 0.0;
        for mode in modes {
            // construct the PDA
            let start = Instant::now();
            let mut factory = NetworkPdaFactory::<W>::new(net, query, mode);
            let mut pda = factory.compile(weight);
            compilation_time += start.elapsed().as_secs_f64();

            // reduce it
            let start = Instant::now();
            record.reduction = pda::reduce(&mut pda, self.reduction, &query.initial_header)
                .expect("the reduction level was validated on construction");
            reduction_time += start.elapsed().as_secs_f64();
            debug!("mode {}: reduction kept {} rules, removed {}", mode, record.reduction.0, record.reduction.1);

            // saturate
            let start = Instant::now();
            let solved = match self.engine {
                Engine::None => {
                    verification_time += start.elapsed().as_secs_f64();
                    break;
                }
                Engine::PostStar => pda::post_star(&pda, query),
                Engine::PreStar => pda::pre_star(&pda, query),
            };
            verification_time += start.elapsed().as_secs_f64();

            // extract and concretise the witness
            let engine_outcome = solved.non_empty;
            let mut result = Outcome::Maybe;
            if let Some(trace) = solved.trace {
                if let Some(steps) = factory.write_trace(&pda, &trace.states, &trace.rules) {
                    result = Outcome::Yes;
                    record.trace = Some(steps);
                    record.trace_weight = trace.weight.report();
                }
            }

            // resolve the mode
            if query.failures == 0 {
                result = if engine_outcome { Outcome::Yes } else { Outcome::No };
            }
            if result == Outcome::Maybe && mode == ApproximationMode::Exact && !engine_outcome {
                result = Outcome::No;
            }
            if result == Outcome::Maybe && mode == ApproximationMode::Over && !engine_outcome {
                result = Outcome::No;
            }
            if result != Outcome::Maybe {
                record.result = result;
                record.mode = mode;
                break;
            }
        }
        if record.result != Outcome::Yes || !self.print_trace {
            record.trace = None;
            record.trace_weight = None;
        }
        if self.timing {
            record.compilation_time = Some(compilation_time);
            record.reduction_time = Some(reduction_time);
            record.verification_time = Some(verification_time);
        }
        record
    }
}
