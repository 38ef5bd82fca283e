use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Image,
    Text,
    Concept,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    HasConcept,
    Similar,
    CoOccurrence,
    #[serde(other)]
    #[default]
    Other,
}

/// Node payload inside a graph element. The backend keeps the Cytoscape
/// `{"data": {...}}` record shape; extra fields (`labels`, ...) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
}

/// A record with `source`/`target` is an edge, anything else is a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementData {
    Edge(EdgeData),
    Node(NodeData),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub data: ElementData,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GraphPayload {
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    #[default]
    Idle,
    Scanning,
}

/// Polled job state. Mutated only by the backend; the client treats it as a
/// read-only mirror. Older backends omit `logs`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ScanProgress {
    #[serde(default)]
    pub status: ScanStatus,
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ScanRequest {
    pub path: String,
    #[serde(default)]
    pub use_llm: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub base_url: String,
}

/// Per-entity metadata, fetched lazily on selection. `summary` is what the
/// backend calls the caption of a text entity.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DetailRecord {
    pub id: i64,
    #[serde(default, alias = "summary")]
    pub caption: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelsRequest {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}
