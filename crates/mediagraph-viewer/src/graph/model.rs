use std::collections::HashMap;

use mediagraph_core::{EdgeData, Element, ElementData, GraphPayload, NodeData, NodeId};

/// The current graph snapshot. Replaced wholesale on every successful fetch;
/// never patched incrementally. `serial` bumps on each replacement so
/// dependents (layout, search) can detect that their view is stale.
#[derive(Default)]
pub struct GraphModel {
    pub nodes: HashMap<NodeId, NodeData>,
    pub edges: Vec<EdgeData>,
    pub serial: u64,
}

impl GraphModel {
    /// Replaces the snapshot. Edges referencing ids absent from the node set
    /// are dropped here rather than trusted downstream; returns how many.
    pub fn replace(&mut self, payload: GraphPayload) -> usize {
        let mut nodes: HashMap<NodeId, NodeData> = HashMap::new();
        let mut edges: Vec<EdgeData> = Vec::new();

        for Element { data } in payload.elements {
            match data {
                ElementData::Node(n) => {
                    nodes.insert(n.id.clone(), n);
                }
                ElementData::Edge(e) => edges.push(e),
            }
        }

        let before = edges.len();
        edges.retain(|e| nodes.contains_key(&e.source) && nodes.contains_key(&e.target));
        let dropped = before - edges.len();

        self.nodes = nodes;
        self.edges = edges;
        self.serial += 1;
        dropped
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn degree(&self, id: &NodeId) -> usize {
        self.edges
            .iter()
            .filter(|e| &e.source == id || &e.target == id)
            .count()
    }

    /// Node ids in stable (sorted) order, for deterministic layouts.
    pub fn sorted_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediagraph_core::{EdgeKind, NodeKind};

    pub(crate) fn node(id: &str, kind: NodeKind, name: &str) -> Element {
        Element {
            data: ElementData::Node(NodeData {
                id: NodeId(id.to_string()),
                kind,
                name: name.to_string(),
                caption: None,
                path: None,
            }),
        }
    }

    pub(crate) fn edge(source: &str, target: &str, kind: EdgeKind) -> Element {
        Element {
            data: ElementData::Edge(EdgeData {
                source: NodeId(source.to_string()),
                target: NodeId(target.to_string()),
                kind,
                weight: None,
            }),
        }
    }

    #[test]
    fn replace_swaps_the_whole_snapshot() {
        let mut model = GraphModel::default();
        model.replace(GraphPayload {
            elements: vec![node("image_1", NodeKind::Image, "a.png")],
        });
        assert_eq!(model.serial, 1);

        model.replace(GraphPayload {
            elements: vec![
                node("image_2", NodeKind::Image, "b.png"),
                node("concept_cat", NodeKind::Concept, "cat"),
                edge("image_2", "concept_cat", EdgeKind::HasConcept),
            ],
        });

        assert_eq!(model.serial, 2);
        assert!(!model.contains(&NodeId("image_1".to_string())));
        assert!(model.contains(&NodeId("image_2".to_string())));
        assert_eq!(model.edges.len(), 1);
    }

    #[test]
    fn dangling_edges_are_dropped() {
        let mut model = GraphModel::default();
        let dropped = model.replace(GraphPayload {
            elements: vec![
                node("image_1", NodeKind::Image, "a.png"),
                node("image_2", NodeKind::Image, "b.png"),
                edge("image_1", "image_2", EdgeKind::Similar),
                edge("image_1", "image_9", EdgeKind::Similar),
                edge("concept_gone", "image_2", EdgeKind::HasConcept),
            ],
        });

        assert_eq!(dropped, 2);
        assert_eq!(model.edges.len(), 1);
    }

    #[test]
    fn raw_backend_payload_ingests_cleanly() {
        let raw = r#"{
            "elements": [
                {"data": {"id": "image_1", "type": "image", "name": "Cat.png", "caption": "a cat", "labels": ["Image"]}},
                {"data": {"id": "concept_cat", "type": "concept", "name": "cat"}},
                {"data": {"source": "image_1", "target": "concept_cat", "type": "has_concept", "weight": 1.0}},
                {"data": {"source": "image_1", "target": "image_99", "type": "similar", "weight": 0.83}}
            ]
        }"#;
        let payload: GraphPayload = serde_json::from_str(raw).expect("payload");

        let mut model = GraphModel::default();
        let dropped = model.replace(payload);

        assert_eq!(dropped, 1, "the edge to the absent image_99 is dropped");
        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.edges.len(), 1);
    }

    #[test]
    fn degree_counts_both_endpoints() {
        let mut model = GraphModel::default();
        model.replace(GraphPayload {
            elements: vec![
                node("image_1", NodeKind::Image, "a.png"),
                node("concept_cat", NodeKind::Concept, "cat"),
                node("concept_dog", NodeKind::Concept, "dog"),
                edge("image_1", "concept_cat", EdgeKind::HasConcept),
                edge("image_1", "concept_dog", EdgeKind::HasConcept),
                edge("concept_cat", "concept_dog", EdgeKind::CoOccurrence),
            ],
        });

        assert_eq!(model.degree(&NodeId("image_1".to_string())), 2);
        assert_eq!(model.degree(&NodeId("concept_cat".to_string())), 2);
    }
}
