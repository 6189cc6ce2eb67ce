//! Skill and interest similarity between two people.

mod profile;

pub use profile::{
    CompatibilityProfile, CompatibilityProfileUpdate, MatchProfile, SkillProfile, WorkStyle,
};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Relationship flags that add fixed bonuses on top of the overlap score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityOptions {
    #[serde(default)]
    pub past_collab: bool,
    #[serde(default)]
    pub similar_availability: bool,
}

/// Weights applied to each component of the raw score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityWeights {
    pub skill_overlap: f64,
    pub interest_overlap: f64,
    pub past_collab_bonus: f64,
    pub time_availability_bonus: f64,
}

impl Default for CompatibilityWeights {
    fn default() -> Self {
        Self {
            skill_overlap: 0.5,
            interest_overlap: 0.3,
            past_collab_bonus: 0.20,
            time_availability_bonus: 0.05,
        }
    }
}

/// Qualitative bucket for a compatibility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchLabel {
    #[serde(rename = "Great match")]
    Great,
    #[serde(rename = "Good match")]
    Good,
    #[serde(rename = "Decent match")]
    Decent,
    #[serde(rename = "Low match")]
    Low,
}

impl MatchLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => MatchLabel::Great,
            60..=79 => MatchLabel::Good,
            40..=59 => MatchLabel::Decent,
            _ => MatchLabel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchLabel::Great => "Great match",
            MatchLabel::Good => "Good match",
            MatchLabel::Decent => "Decent match",
            MatchLabel::Low => "Low match",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityBreakdown {
    pub skill_overlap: f64,
    pub interest_overlap: f64,
    pub past_collab_bonus: f64,
    pub time_availability_bonus: f64,
}

/// Scored comparison of two profiles. Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub score: u8,
    pub label: MatchLabel,
    pub breakdown: CompatibilityBreakdown,
    pub reasons: Vec<String>,
}

/// Stateless scorer; the weights are fixed for the lifetime of the service.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityScorer {
    weights: CompatibilityWeights,
}

impl CompatibilityScorer {
    pub fn new(weights: CompatibilityWeights) -> Self {
        Self { weights }
    }

    pub fn score<A, B>(&self, left: &A, right: &B, options: CompatibilityOptions) -> CompatibilityResult
    where
        A: SkillProfile + ?Sized,
        B: SkillProfile + ?Sized,
    {
        let weights = &self.weights;
        let skill_overlap = skill_overlap(left.skills(), right.skills());
        let interest_overlap = interest_overlap(left.interests(), right.interests());
        let past_collab_bonus = if options.past_collab {
            weights.past_collab_bonus
        } else {
            0.0
        };
        let time_availability_bonus = if options.similar_availability {
            weights.time_availability_bonus
        } else {
            0.0
        };

        let raw = skill_overlap * weights.skill_overlap
            + interest_overlap * weights.interest_overlap
            + past_collab_bonus
            + time_availability_bonus;
        let score = (raw.clamp(0.0, 1.0) * 100.0).round() as u8;

        let mut reasons = Vec::new();
        if skill_overlap > 0.0 {
            reasons.push("Shared stack".to_string());
        }
        if interest_overlap > 0.0 {
            reasons.push("Similar interests".to_string());
        }
        if options.past_collab {
            reasons.push("Past collaboration".to_string());
        }

        CompatibilityResult {
            score,
            label: MatchLabel::from_score(score),
            breakdown: CompatibilityBreakdown {
                skill_overlap,
                interest_overlap,
                past_collab_bonus,
                time_availability_bonus,
            },
            reasons,
        }
    }
}

/// Score two profiles with the default weights.
pub fn compute_compatibility<A, B>(
    left: &A,
    right: &B,
    options: CompatibilityOptions,
) -> CompatibilityResult
where
    A: SkillProfile + ?Sized,
    B: SkillProfile + ?Sized,
{
    CompatibilityScorer::default().score(left, right, options)
}

/// Jaccard index of the normalized skill sets; 0 when both are empty.
pub fn skill_overlap(left: &[String], right: &[String]) -> f64 {
    let left = normalized(left);
    let right = normalized(right);
    let shared = left.intersection(&right).count();
    let union = left.union(&right).count().max(1);
    shared as f64 / union as f64
}

/// Shared interests relative to the larger interest set; 0 when both are empty.
pub fn interest_overlap(left: &[String], right: &[String]) -> f64 {
    let left = normalized(left);
    let right = normalized(right);
    let larger = left.len().max(right.len());
    if larger == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / larger as f64
}

pub(crate) fn normalized(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}
