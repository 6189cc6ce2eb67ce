use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::compatibility::normalized;
use super::domain::{ContentKind, UserRecord};
use super::repository::{ActivityRepository, RepositoryError};

const PROFILE_FIELD_WEIGHT: f32 = 12.5;
const SECONDS_PER_WEEK: i64 = 7 * 24 * 60 * 60;

/// Aggregate activity counters for one user, computed on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStatsSnapshot {
    pub projects_count: u64,
    pub ideas_count: u64,
    pub comments_count: u64,
    pub likes_received: u64,
    pub saves_received: u64,
    pub votes_count: u64,
    pub collaborations_count: u64,
    pub account_age_weeks: u64,
    /// 0 to 100 in steps of 12.5.
    pub profile_completion: f32,
    pub skills_count: u64,
    pub is_early_adopter: bool,
    pub is_beta_tester: bool,
}

/// Builds [`UserStatsSnapshot`]s by fanning out the independent count reads.
pub struct StatsAggregator<A> {
    activity: Arc<A>,
}

impl<A> Clone for StatsAggregator<A> {
    fn clone(&self) -> Self {
        Self {
            activity: Arc::clone(&self.activity),
        }
    }
}

impl<A> StatsAggregator<A>
where
    A: ActivityRepository,
{
    pub fn new(activity: Arc<A>) -> Self {
        Self { activity }
    }

    pub async fn snapshot(
        &self,
        user: &UserRecord,
        now: DateTime<Utc>,
    ) -> Result<UserStatsSnapshot, RepositoryError> {
        let activity = self.activity.as_ref();
        let user_id = &user.id;

        let (projects, ideas, comments, votes, collaborations, likes, saves) = tokio::try_join!(
            activity.count_authored(user_id, ContentKind::Project),
            activity.count_authored(user_id, ContentKind::Idea),
            activity.count_authored(user_id, ContentKind::Comment),
            activity.count_votes(user_id),
            activity.count_accepted_collaborations(user_id),
            activity.sum_likes_received(user_id),
            activity.sum_saves_received(user_id),
        )?;

        Ok(UserStatsSnapshot {
            projects_count: projects,
            ideas_count: ideas,
            comments_count: comments,
            likes_received: likes,
            saves_received: saves,
            votes_count: votes,
            collaborations_count: collaborations,
            account_age_weeks: account_age_weeks(user.created_at, now),
            profile_completion: profile_completion(user),
            skills_count: normalized(&user.skills).len() as u64,
            is_early_adopter: user.is_early_adopter,
            is_beta_tester: user.is_beta_tester,
        })
    }
}

/// Whole weeks elapsed since account creation; clock skew never yields a negative age.
pub fn account_age_weeks(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let seconds = (now - created_at).num_seconds().max(0);
    (seconds / SECONDS_PER_WEEK) as u64
}

/// 12.5 points for each populated field among name, bio, skills, avatar style,
/// location, website, github and linkedin.
pub fn profile_completion(user: &UserRecord) -> f32 {
    let text_fields = [
        Some(user.name.as_str()),
        user.bio.as_deref(),
        user.avatar_style.as_deref(),
        user.location.as_deref(),
        user.website.as_deref(),
        user.github.as_deref(),
        user.linkedin.as_deref(),
    ];
    let populated = text_fields
        .iter()
        .filter(|field| field.is_some_and(|value| !value.trim().is_empty()))
        .count()
        + usize::from(!normalized(&user.skills).is_empty());

    (populated as f32 * PROFILE_FIELD_WEIGHT).min(100.0)
}
