//! Alternative package suggestions

use serde::{Deserialize, Serialize};

/// A package suggested in place of a vulnerable one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageAlternative {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Quality score in 0..=1
    pub quality: f64,
    /// Popularity score in 0..=1
    pub stars: f64,
    /// Downloads in the last week
    pub downloads: u64,
}

impl PackageAlternative {
    /// Quality as a rounded percentage
    pub fn quality_percent(&self) -> u32 {
        to_percent(self.quality)
    }

    /// Popularity as a rounded percentage
    pub fn popularity_percent(&self) -> u32 {
        to_percent(self.stars)
    }
}

fn to_percent(score: f64) -> u32 {
    (score.clamp(0.0, 1.0) * 100.0).round() as u32
}
