use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::compatibility::{CompatibilityProfile, MatchProfile};

/// Identifier wrapper for platform users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read model of a user as owned by the external user store.
///
/// The engagement core only writes `points` (through the repository) and the
/// embedded compatibility profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub avatar_style: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_early_adopter: bool,
    #[serde(default)]
    pub is_beta_tester: bool,
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub compatibility_profile: Option<CompatibilityProfile>,
}

fn default_active() -> bool {
    true
}

impl UserRecord {
    /// Bare active account with only the mandatory fields populated.
    pub fn new(id: impl Into<String>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            bio: None,
            skills: Vec::new(),
            avatar_style: None,
            location: None,
            website: None,
            github: None,
            linkedin: None,
            created_at,
            is_active: true,
            is_early_adopter: false,
            is_beta_tester: false,
            points: 0,
            followers_count: 0,
            compatibility_profile: None,
        }
    }

    /// Skills and interests used when comparing two stored users.
    ///
    /// Profile skills take precedence; the account-level skill list is the fallback
    /// for users who never completed compatibility setup.
    pub fn match_profile(&self) -> MatchProfile {
        match &self.compatibility_profile {
            Some(profile) => MatchProfile {
                skills: if profile.skills.is_empty() {
                    self.skills.clone()
                } else {
                    profile.skills.clone()
                },
                interests: profile.interests.clone(),
            },
            None => MatchProfile {
                skills: self.skills.clone(),
                interests: Vec::new(),
            },
        }
    }
}

/// Authored content collections counted for stats aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Project,
    Idea,
    Comment,
}

/// The primary user action that triggered a badge check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementAction {
    ProjectCreated,
    IdeaCreated,
    CommentCreated,
    LikeReceived,
    SaveReceived,
    VoteCast,
    CollaborationAccepted,
    ProfileUpdated,
    #[default]
    #[serde(other)]
    Other,
}

impl EngagementAction {
    pub fn label(&self) -> &'static str {
        match self {
            EngagementAction::ProjectCreated => "project_created",
            EngagementAction::IdeaCreated => "idea_created",
            EngagementAction::CommentCreated => "comment_created",
            EngagementAction::LikeReceived => "like_received",
            EngagementAction::SaveReceived => "save_received",
            EngagementAction::VoteCast => "vote_cast",
            EngagementAction::CollaborationAccepted => "collaboration_accepted",
            EngagementAction::ProfileUpdated => "profile_updated",
            EngagementAction::Other => "other",
        }
    }
}
