use serde::Deserialize;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use crate::error::{PrepError, Result};

/// Topic/term weights exported from an already-fit topic model
#[derive(Debug, Clone, Deserialize)]
pub struct TopicMatrix {
    /// One weight row per topic, indexed like `feature_names`
    pub components: Vec<Vec<f64>>,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub topic_names: Option<Vec<String>>,
}

impl TopicMatrix {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let matrix: TopicMatrix = serde_json::from_str(&content)?;
        if let Some(row) = matrix
            .components
            .iter()
            .position(|weights| weights.len() != matrix.feature_names.len())
        {
            return Err(PrepError::Config(format!(
                "topic {} has {} weights but there are {} feature names",
                row,
                matrix.components[row].len(),
                matrix.feature_names.len()
            )));
        }
        Ok(matrix)
    }

    pub fn display(&self, top_n: usize) -> String {
        display_topics(
            &self.components,
            &self.feature_names,
            top_n,
            self.topic_names.as_deref(),
        )
    }
}

/// Render the `top_n` highest-weight terms of every topic.
///
/// `components` holds one weight row per topic, indexed like `feature_names`.
/// A topic is headed `Topic: '<name>'` when `topic_names` gives it a
/// non-empty name and `Topic <i>` otherwise. Equal weights keep feature order.
pub fn display_topics(
    components: &[Vec<f64>],
    feature_names: &[String],
    top_n: usize,
    topic_names: Option<&[String]>,
) -> String {
    let mut out = String::new();
    for (idx, weights) in components.iter().enumerate() {
        let name = topic_names
            .and_then(|names| names.get(idx))
            .filter(|name| !name.is_empty());
        match name {
            Some(name) => out.push_str(&format!("\nTopic: '{}'\n", name)),
            None => out.push_str(&format!("\nTopic {}\n", idx)),
        }

        let mut ranked: Vec<(usize, f64)> = weights
            .iter()
            .copied()
            .enumerate()
            .filter(|(i, _)| *i < feature_names.len())
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let words: Vec<&str> = ranked
            .iter()
            .take(top_n)
            .map(|(i, _)| feature_names[*i].as_str())
            .collect();
        out.push_str(&words.join(", "));
        out.push('\n');
    }
    out
}
