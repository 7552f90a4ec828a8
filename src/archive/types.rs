//! Record types for the three collections.
//!
//! [`Entry`] is the root record. [`Echo`] audits one public search and
//! [`Reflection`] is a curator-generated association ("ghost thread"). Both
//! reference entries by id or snapshot and never own them.
//!
//! Field names follow the on-disk documents written by earlier versions of the
//! journal, so existing `entries.json` / `echoes.json` / `ghost-threads.json`
//! files load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Record;

/// Kind of journaled input. Only text is processed today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    #[default]
    Text,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            _ => Err(format!("input type '{s}' not yet supported")),
        }
    }
}

/// The five named projections read off the head of an embedding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionDimensions {
    pub intensity: f32,
    pub valence: f32,
    pub activation: f32,
    pub clarity: f32,
    pub resonance: f32,
}

impl EmotionDimensions {
    /// Take the first five components of `embedding`; missing components are 0.
    pub fn project(embedding: &[f32]) -> Self {
        let at = |i: usize| embedding.get(i).copied().unwrap_or(0.0);
        Self {
            intensity: at(0),
            valence: at(1),
            activation: at(2),
            clarity: at(3),
            resonance: at(4),
        }
    }

    pub fn as_array(&self) -> [f32; 5] {
        [
            self.intensity,
            self.valence,
            self.activation,
            self.clarity,
            self.resonance,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionDetails {
    /// Cosine similarity to the winning archetype, in `[-1, 1]`.
    pub confidence: f64,
    pub dimensions: EmotionDimensions,
}

/// Affective context captured at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoTrace {
    pub timestamp: DateTime<Utc>,
    pub resonance_score: f32,
    pub emotional_context: EmotionDimensions,
}

/// One journaled unit. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Assigned by the store on append.
    #[serde(default)]
    pub id: u64,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    pub embedding: Vec<f32>,
    /// Primary archetype label.
    pub emotion: String,
    pub emotion_details: EmotionDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo_trace: Option<EchoTrace>,
    /// Creation instant.
    pub timestamp: DateTime<Utc>,
}

/// An entry paired with its similarity to some query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResonantEntry {
    #[serde(flatten)]
    pub entry: Entry,
    pub similarity: f64,
}

/// Audit record of one externally initiated similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "sourceEmbedding")]
    pub source_embedding: Vec<f32>,
    /// Entry ids returned, in rank order.
    pub results: Vec<u64>,
    pub timestamp: DateTime<Utc>,
}

pub const REFLECTION_KIND: &str = "ghost-reflection";

fn reflection_kind() -> String {
    REFLECTION_KIND.to_string()
}

/// A curator-generated association between one sampled entry and its neighbors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    #[serde(default)]
    pub id: u64,
    /// Snapshot of the sampled entry.
    pub original: Entry,
    /// Neighbor snapshots, most similar first.
    #[serde(alias = "echoes")]
    pub related: Vec<ResonantEntry>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type", default = "reflection_kind")]
    pub kind: String,
}

impl Reflection {
    pub fn new(original: Entry, related: Vec<ResonantEntry>) -> Self {
        Self {
            id: 0,
            original,
            related,
            timestamp: Utc::now(),
            kind: reflection_kind(),
        }
    }
}

impl Record for Entry {
    const COLLECTION: &'static str = "entries";
    const DOCUMENT: &'static str = "entries.json";

    fn id(&self) -> u64 {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}

impl Record for Echo {
    const COLLECTION: &'static str = "echoes";
    const DOCUMENT: &'static str = "echoes.json";

    fn id(&self) -> u64 {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}

impl Record for Reflection {
    const COLLECTION: &'static str = "ghost_threads";
    const DOCUMENT: &'static str = "ghost-threads.json";

    fn id(&self) -> u64 {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}
