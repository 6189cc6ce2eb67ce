use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Anything that exposes the two tag lists the scorer compares.
pub trait SkillProfile {
    fn skills(&self) -> &[String];
    fn interests(&self) -> &[String];
}

/// Minimal inline profile accepted by the scoring endpoint.
///
/// Missing lists, `null`, or a non-array value all deserialize to an empty list so the
/// scorer stays total at the HTTP boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchProfile {
    #[serde(default, deserialize_with = "lenient_tags")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub interests: Vec<String>,
}

impl MatchProfile {
    pub fn new<S, I>(skills: S, interests: I) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            skills: skills.into_iter().map(Into::into).collect(),
            interests: interests.into_iter().map(Into::into).collect(),
        }
    }
}

impl SkillProfile for MatchProfile {
    fn skills(&self) -> &[String] {
        &self.skills
    }

    fn interests(&self) -> &[String] {
        &self.interests
    }
}

/// Working preferences captured during compatibility setup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_style: Option<String>,
}

impl WorkStyle {
    fn merge(&mut self, update: WorkStyle) {
        if update.team_preference.is_some() {
            self.team_preference = update.team_preference;
        }
        if update.pace.is_some() {
            self.pace = update.pace;
        }
        if update.communication.is_some() {
            self.communication = update.communication;
        }
        if update.decision_style.is_some() {
            self.decision_style = update.decision_style;
        }
    }
}

/// Per-user profile embedded in the user record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityProfile {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub preferred_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_hours: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_work_hours: Option<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub work_style: WorkStyle,
}

impl CompatibilityProfile {
    /// Create the profile in `slot` on first setup, otherwise merge the update into
    /// it. Returns the stored result.
    pub fn upsert(slot: &mut Option<Self>, update: CompatibilityProfileUpdate) -> Self {
        let profile = slot.get_or_insert_with(Self::default);
        profile.apply(update);
        profile.clone()
    }

    /// Apply a partial update; only supplied fields change.
    pub fn apply(&mut self, update: CompatibilityProfileUpdate) {
        if let Some(skills) = update.skills {
            self.skills = dedup_tags(skills);
        }
        if let Some(interests) = update.interests {
            self.interests = dedup_tags(interests);
        }
        if let Some(roles) = update.preferred_roles {
            self.preferred_roles = dedup_tags(roles);
        }
        if let Some(hours) = update.availability_hours {
            self.availability_hours = Some(hours);
        }
        if let Some(zone) = update.time_zone {
            self.time_zone = non_blank(zone);
        }
        if let Some(hours) = update.preferred_work_hours {
            self.preferred_work_hours = non_blank(hours);
        }
        if let Some(goals) = update.goals {
            self.goals = dedup_tags(goals);
        }
        if let Some(style) = update.work_style {
            self.work_style.merge(style);
        }
    }

    /// Two profiles are considered to have similar availability when both declare
    /// the same time zone.
    pub fn shares_availability_with(&self, other: &CompatibilityProfile) -> bool {
        match (&self.time_zone, &other.time_zone) {
            (Some(left), Some(right)) => left.trim().eq_ignore_ascii_case(right.trim()),
            _ => false,
        }
    }
}

impl SkillProfile for CompatibilityProfile {
    fn skills(&self) -> &[String] {
        &self.skills
    }

    fn interests(&self) -> &[String] {
        &self.interests
    }
}

/// Partial update payload for compatibility setup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityProfileUpdate {
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub preferred_roles: Option<Vec<String>>,
    #[serde(default)]
    pub availability_hours: Option<u16>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub preferred_work_hours: Option<String>,
    #[serde(default)]
    pub goals: Option<Vec<String>>,
    #[serde(default)]
    pub work_style: Option<WorkStyle>,
}

/// Trim, drop blanks and remove case-insensitive duplicates, keeping the first spelling.
fn dedup_tags(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(value.to_lowercase()))
        .collect()
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_lists_deserialize_as_empty() {
        let profile: MatchProfile =
            serde_json::from_value(json!({ "skills": "React", "interests": null }))
                .expect("lenient payload");
        assert!(profile.skills.is_empty());
        assert!(profile.interests.is_empty());

        let profile: MatchProfile = serde_json::from_value(json!({ "skills": ["Rust", 42, {}] }))
            .expect("mixed array");
        assert_eq!(profile.skills, vec!["Rust".to_string(), "42".to_string()]);
    }

    #[test]
    fn partial_update_only_touches_supplied_fields() {
        let mut slot = None;
        let created = CompatibilityProfile::upsert(
            &mut slot,
            CompatibilityProfileUpdate {
                skills: Some(vec!["React".into(), " react ".into(), "Node".into()]),
                time_zone: Some("America/Chicago".into()),
                work_style: Some(WorkStyle {
                    pace: Some("steady".into()),
                    ..WorkStyle::default()
                }),
                ..CompatibilityProfileUpdate::default()
            },
        );
        assert_eq!(created.skills, vec!["React".to_string(), "Node".to_string()]);

        let profile = CompatibilityProfile::upsert(&mut slot, CompatibilityProfileUpdate {
            interests: Some(vec!["AI".into()]),
            work_style: Some(WorkStyle {
                communication: Some("async".into()),
                ..WorkStyle::default()
            }),
            ..CompatibilityProfileUpdate::default()
        });

        assert_eq!(profile.skills.len(), 2);
        assert_eq!(profile.interests, vec!["AI".to_string()]);
        assert_eq!(profile.time_zone.as_deref(), Some("America/Chicago"));
        assert_eq!(profile.work_style.pace.as_deref(), Some("steady"));
        assert_eq!(profile.work_style.communication.as_deref(), Some("async"));
        assert_eq!(slot, Some(profile));
    }

    #[test]
    fn availability_compares_time_zones() {
        let chicago = CompatibilityProfile {
            time_zone: Some("America/Chicago".into()),
            ..CompatibilityProfile::default()
        };
        let also_chicago = CompatibilityProfile {
            time_zone: Some("america/chicago ".into()),
            ..CompatibilityProfile::default()
        };
        let unset = CompatibilityProfile::default();

        assert!(chicago.shares_availability_with(&also_chicago));
        assert!(!chicago.shares_availability_with(&unset));
    }
}
