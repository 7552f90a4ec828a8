//! Emotion classification against a fixed, ordered archetype registry.
//!
//! The first five components of an embedding are read as intensity, valence,
//! activation, clarity and resonance, and compared by cosine similarity with
//! each archetype. Nothing guarantees that a provider's embedding space lines
//! those coordinates up with the named dimensions; treat the label as a stable
//! bucket, not a semantic judgement.

use super::similarity::cosine_similarity;
use super::types::{EmotionDetails, EmotionDimensions};

/// A named reference vector in the five-dimensional emotion space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Archetype {
    pub name: &'static str,
    pub vector: [f32; 5],
}

/// Default registry. Order is part of the contract: ties go to the earlier one.
pub const ARCHETYPES: [Archetype; 10] = [
    // Core emotional states
    Archetype { name: "ache", vector: [0.9, 0.1, -0.6, -0.4, 0.2] },
    Archetype { name: "drift", vector: [0.2, -0.8, 0.7, 0.3, -0.1] },
    Archetype { name: "joy", vector: [0.8, 0.9, 0.2, 0.7, 0.8] },
    Archetype { name: "peace", vector: [-0.3, 0.6, 0.5, 0.4, 0.7] },
    // Nuanced states
    Archetype { name: "wonder", vector: [0.5, 0.3, 0.8, 0.9, 0.4] },
    Archetype { name: "melancholy", vector: [-0.4, -0.2, 0.3, -0.5, 0.6] },
    Archetype { name: "resonance", vector: [0.3, 0.7, 0.8, 0.6, 0.9] },
    Archetype { name: "tension", vector: [0.7, -0.5, -0.3, 0.2, -0.4] },
    Archetype { name: "emergence", vector: [0.4, 0.6, 0.9, 0.8, 0.5] },
    Archetype { name: "echo", vector: [0.2, 0.4, 0.7, 0.5, 0.8] },
];

/// Result of classifying one embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub primary: String,
    pub confidence: f64,
    pub dimensions: EmotionDimensions,
}

impl Classification {
    pub fn details(&self) -> EmotionDetails {
        EmotionDetails {
            confidence: self.confidence,
            dimensions: self.dimensions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmotionClassifier {
    registry: Vec<Archetype>,
}

impl Default for EmotionClassifier {
    fn default() -> Self {
        Self::new(ARCHETYPES.to_vec())
    }
}

impl EmotionClassifier {
    /// Build a classifier over `registry`, evaluated in the given order.
    ///
    /// An empty registry classifies everything as `"default"` with confidence 0.
    pub fn new(registry: Vec<Archetype>) -> Self {
        Self { registry }
    }

    /// Classify `embedding`. Pure and deterministic.
    pub fn classify(&self, embedding: &[f32]) -> Classification {
        let dimensions = EmotionDimensions::project(embedding);
        let projection = dimensions.as_array();

        let mut best: Option<(&Archetype, f64)> = None;
        for archetype in &self.registry {
            let sim = cosine_similarity(&projection, &archetype.vector);
            // Strict comparison keeps the first archetype on ties.
            if best.map_or(true, |(_, top)| sim > top) {
                best = Some((archetype, sim));
            }
        }

        let (primary, confidence) = match best {
            Some((archetype, sim)) => (archetype.name.to_string(), sim),
            None => ("default".to_string(), 0.0),
        };

        Classification {
            primary,
            confidence,
            dimensions,
        }
    }
}
