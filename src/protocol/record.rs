//! Per-image output records: boxes paired with class-name scores.

use serde::{Deserialize, Serialize};

use super::AxisAlignedBox;

/// Insertion-ordered mapping from class name to score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassScores(Vec<(String, f32)>);

impl ClassScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Insert or overwrite the score for `name`.
    pub fn insert(&mut self, name: impl Into<String>, score: f32) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = score,
            None => self.0.push((name, score)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, score)| *score)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(name, score)| (name.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Name and score of the highest-scoring class.
    pub fn top(&self) -> Option<(&str, f32)> {
        self.iter().fold(None, |best, (name, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((name, score)),
        })
    }
}

impl<S: Into<String>> FromIterator<(S, f32)> for ClassScores {
    fn from_iter<T: IntoIterator<Item = (S, f32)>>(iter: T) -> Self {
        let mut scores = Self::new();
        for (name, score) in iter {
            scores.insert(name, score);
        }
        scores
    }
}

/// One detected object in the output protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredBox {
    pub bbox: AxisAlignedBox,
    pub scores: ClassScores,
}

impl ScoredBox {
    pub fn new(bbox: AxisAlignedBox, scores: ClassScores) -> Self {
        Self { bbox, scores }
    }
}

/// All detected objects of one image, in detector order.
pub type DetectionRecord = Vec<ScoredBox>;
