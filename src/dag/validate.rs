// src/dag/validate.rs

//! Template graph validation.
//!
//! Two independent checks guard every template write:
//! - ordering: each preceding code must sort strictly before its owner
//! - acyclicity: a depth-first walk from the candidate along `preceding`
//!   edges must never revisit a code on the current path
//!
//! Consistent ordering already rules out cycles; the walk exists for legacy
//! or hand-edited data that slipped past the ordering rule.

use std::collections::{BTreeMap, HashSet};

use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::order::precedes;
use crate::dag::template::TaskTemplate;
use crate::errors::{Result, SeasonflowError};

/// Template arena keyed by order code: `order -> preceding codes`.
pub type PrecedenceMap = BTreeMap<String, Vec<String>>;

/// Build a [`PrecedenceMap`] from stored templates.
pub fn precedence_map<'a, I>(templates: I) -> PrecedenceMap
where
    I: IntoIterator<Item = &'a TaskTemplate>,
{
    templates
        .into_iter()
        .map(|t| (t.order.to_string(), t.preceding_codes()))
        .collect()
}

/// Preceding codes that do not sort strictly before `candidate`.
pub fn ordering_violations(candidate: &str, preceding: &[String]) -> Vec<String> {
    preceding
        .iter()
        .filter(|p| !precedes(p, candidate))
        .cloned()
        .collect()
}

/// Walk `preceding` edges from `candidate` and return the first cycle found,
/// as a path that starts and ends on the repeated code.
pub fn find_cycle(candidate: &str, edges: &PrecedenceMap) -> Option<Vec<String>> {
    // Edge direction: task -> preceding task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    graph.add_node(candidate);
    for (code, preds) in edges.iter() {
        graph.add_node(code.as_str());
        for pred in preds.iter() {
            graph.add_edge(code.as_str(), pred.as_str(), ());
        }
    }

    let mut walk = CycleWalk {
        graph: &graph,
        path: Vec::new(),
        on_path: HashSet::new(),
        finished: HashSet::new(),
    };
    walk.visit(candidate)
}

struct CycleWalk<'g, 'a> {
    graph: &'g DiGraphMap<&'a str, ()>,
    path: Vec<&'a str>,
    on_path: HashSet<&'a str>,
    /// Codes whose whole upstream was already walked without finding a cycle.
    finished: HashSet<&'a str>,
}

impl<'g, 'a> CycleWalk<'g, 'a> {
    fn visit(&mut self, node: &'a str) -> Option<Vec<String>> {
        if self.on_path.contains(node) {
            let start = self.path.iter().position(|n| *n == node).unwrap_or(0);
            let mut cycle: Vec<String> = self.path[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(node.to_string());
            return Some(cycle);
        }
        if self.finished.contains(node) {
            return None;
        }

        self.path.push(node);
        self.on_path.insert(node);

        let graph = self.graph;
        for next in graph.neighbors(node) {
            if let Some(cycle) = self.visit(next) {
                return Some(cycle);
            }
        }

        self.path.pop();
        self.on_path.remove(node);
        self.finished.insert(node);
        None
    }
}

/// Validate a create/update of a single template against the library.
///
/// `existing` is the stored library; the candidate's own entry is overlaid on
/// it so the same call serves inserts and edits. Nothing is mutated: callers
/// only persist after this returns `Ok`.
pub fn validate_template_graph(
    candidate: &str,
    preceding: &[String],
    existing: &PrecedenceMap,
) -> Result<()> {
    let mut overlay = existing.clone();
    overlay.insert(candidate.to_string(), preceding.to_vec());

    let unknown: Vec<&String> = preceding
        .iter()
        .filter(|p| !overlay.contains_key(p.as_str()))
        .collect();
    if !unknown.is_empty() {
        return Err(SeasonflowError::Validation(format!(
            "task '{}' has unknown preceding task(s) {:?}",
            candidate, unknown
        )));
    }

    // Both checks always run; ordering is reported first.
    let offending = ordering_violations(candidate, preceding);
    let cycle = find_cycle(candidate, &overlay);

    if !offending.is_empty() {
        return Err(SeasonflowError::OrderingViolation {
            order: candidate.to_string(),
            offending,
        });
    }
    if let Some(path) = cycle {
        return Err(SeasonflowError::CycleDetected { path });
    }

    debug!(task = %candidate, preceding = ?preceding, "template graph valid");
    Ok(())
}

/// Validate a whole template library (e.g. a freshly loaded config file).
pub fn validate_library(templates: &[TaskTemplate]) -> Result<()> {
    let mut seen = HashSet::new();
    for t in templates.iter() {
        if !seen.insert(t.order.as_str()) {
            return Err(SeasonflowError::Validation(format!(
                "duplicate template order code '{}'",
                t.order
            )));
        }
    }

    let map = precedence_map(templates);
    for t in templates.iter() {
        validate_template_graph(t.order.as_str(), &t.preceding_codes(), &map)?;
    }
    Ok(())
}
