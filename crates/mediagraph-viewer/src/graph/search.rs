use std::collections::HashSet;

use mediagraph_core::{NodeData, NodeId};

use crate::graph::model::GraphModel;

/// Visual state of a rendered element while a query is active. Neutral when
/// no query is set; otherwise every element is either highlighted or dimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Emphasis {
    #[default]
    Neutral,
    Highlighted,
    Dimmed,
}

#[derive(Default)]
pub struct SearchState {
    /// Live text-box binding; becomes `applied` via `apply`.
    pub query: String,
    applied: String,
    matches: HashSet<NodeId>,
}

fn node_matches(query_lower: &str, node: &NodeData) -> bool {
    if node.name.to_lowercase().contains(query_lower) {
        return true;
    }
    node.caption
        .as_deref()
        .is_some_and(|caption| caption.to_lowercase().contains(query_lower))
}

impl SearchState {
    /// Applies a query against the current snapshot. Returns the matched ids
    /// (sorted) when the viewport should re-frame: only on a query
    /// *transition* with at least one match. Re-applying the same query is
    /// idempotent and returns None; so do empty queries and empty results.
    pub fn apply(&mut self, query: &str, model: &GraphModel) -> Option<Vec<NodeId>> {
        let transition = query != self.applied;
        self.applied = query.to_string();
        self.recompute(model);

        if transition && self.is_active() && !self.matches.is_empty() {
            let mut ids: Vec<NodeId> = self.matches.iter().cloned().collect();
            ids.sort();
            return Some(ids);
        }
        None
    }

    /// Re-derives the match set after a snapshot replacement. Never moves
    /// the camera.
    pub fn reapply(&mut self, model: &GraphModel) {
        self.recompute(model);
    }

    fn recompute(&mut self, model: &GraphModel) {
        self.matches.clear();
        let q = self.applied.trim().to_lowercase();
        if q.is_empty() {
            return;
        }
        for (id, node) in model.nodes.iter() {
            if node_matches(&q, node) {
                self.matches.insert(id.clone());
            }
        }
    }

    pub fn is_active(&self) -> bool {
        !self.applied.trim().is_empty()
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn node_emphasis(&self, id: &NodeId) -> Emphasis {
        if !self.is_active() {
            Emphasis::Neutral
        } else if self.matches.contains(id) {
            Emphasis::Highlighted
        } else {
            Emphasis::Dimmed
        }
    }

    /// Edges carry no name or caption, so they never match: any active
    /// query dims every edge.
    pub fn edge_emphasis(&self) -> Emphasis {
        if self.is_active() {
            Emphasis::Dimmed
        } else {
            Emphasis::Neutral
        }
    }
}
