use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engagement::domain::UserId;

/// Unique catalog key for a badge, e.g. `first_project`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeKey(pub String);

impl BadgeKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BadgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Achievement,
    Milestone,
    Special,
    Social,
    Technical,
}

impl BadgeCategory {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "achievement" => Some(Self::Achievement),
            "milestone" => Some(Self::Milestone),
            "special" => Some(Self::Special),
            "social" => Some(Self::Social),
            "technical" => Some(Self::Technical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl BadgeRarity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "common" => Some(Self::Common),
            "rare" => Some(Self::Rare),
            "epic" => Some(Self::Epic),
            "legendary" => Some(Self::Legendary),
            _ => None,
        }
    }
}

/// Snapshot counter a `count` criterion compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountTarget {
    Projects,
    Ideas,
    Comments,
    LikesReceived,
    SavesReceived,
    Votes,
    Collaborations,
    Skills,
    #[serde(other)]
    Unsupported,
}

impl CountTarget {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "projects" => Self::Projects,
            "ideas" => Self::Ideas,
            "comments" => Self::Comments,
            "likes_received" => Self::LikesReceived,
            "saves_received" => Self::SavesReceived,
            "votes" => Self::Votes,
            "collaborations" => Self::Collaborations,
            "skills" => Self::Skills,
            _ => Self::Unsupported,
        }
    }
}

/// Named custom rule. Catalog entries spell these as `account_age_weeks >= 52`,
/// `profile_completion >= 100`, `early_adopter` or `beta_tester`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomPredicate {
    AccountAgeWeeks(u64),
    ProfileCompletion(f32),
    EarlyAdopter,
    BetaTester,
    Unrecognized(String),
}

impl CustomPredicate {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "early_adopter" => return Self::EarlyAdopter,
            "beta_tester" => return Self::BetaTester,
            _ => {}
        }

        if let Some((field, bound)) = normalized.split_once(">=") {
            let bound = bound.trim();
            match field.trim() {
                "account_age_weeks" => {
                    if let Ok(weeks) = bound.parse::<u64>() {
                        return Self::AccountAgeWeeks(weeks);
                    }
                }
                "profile_completion" => {
                    if let Ok(percent) = bound.parse::<f32>() {
                        if percent.is_finite() {
                            return Self::ProfileCompletion(percent);
                        }
                    }
                }
                _ => {}
            }
        }

        Self::Unrecognized(raw.trim().to_string())
    }
}

impl fmt::Display for CustomPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomPredicate::AccountAgeWeeks(weeks) => write!(f, "account_age_weeks >= {weeks}"),
            CustomPredicate::ProfileCompletion(percent) => {
                write!(f, "profile_completion >= {percent}")
            }
            CustomPredicate::EarlyAdopter => f.write_str("early_adopter"),
            CustomPredicate::BetaTester => f.write_str("beta_tester"),
            CustomPredicate::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl From<String> for CustomPredicate {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<CustomPredicate> for String {
    fn from(value: CustomPredicate) -> Self {
        value.to_string()
    }
}

/// Qualification rule for a badge.
///
/// Serialized with a `type` tag (`count`, `rank`, `custom`); any other tag
/// deserializes to `Unsupported`, which never qualifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BadgeCriteria {
    Count { target: CountTarget, threshold: u64 },
    Rank { threshold: u32 },
    Custom { predicate: CustomPredicate },
    #[serde(other)]
    Unsupported,
}

impl BadgeCriteria {
    pub fn is_rank(&self) -> bool {
        matches!(self, BadgeCriteria::Rank { .. })
    }
}

/// Catalog entry. Seeded by admins and effectively immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub key: BadgeKey,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: BadgeCategory,
    pub rarity: BadgeRarity,
    pub criteria: BadgeCriteria,
    pub points: u32,
    pub is_active: bool,
}

/// Join row recording that a user earned a badge. Unique on `(user_id, badge_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBadge {
    pub user_id: UserId,
    pub badge_key: BadgeKey,
    pub earned_at: DateTime<Utc>,
    pub points_awarded: u32,
    pub is_displayed: bool,
}

impl UserBadge {
    pub fn earned(user_id: UserId, badge: &Badge, earned_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            badge_key: badge.key.clone(),
            earned_at,
            points_awarded: badge.points,
            is_displayed: true,
        }
    }
}

/// Badge newly granted by a single engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardedBadge {
    pub key: BadgeKey,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: BadgeCategory,
    pub rarity: BadgeRarity,
    pub points: u32,
    pub earned_at: DateTime<Utc>,
}

impl AwardedBadge {
    pub fn from_badge(badge: &Badge, earned_at: DateTime<Utc>) -> Self {
        Self {
            key: badge.key.clone(),
            name: badge.name.clone(),
            description: badge.description.clone(),
            icon: badge.icon.clone(),
            category: badge.category,
            rarity: badge.rarity,
            points: badge.points,
            earned_at,
        }
    }
}
