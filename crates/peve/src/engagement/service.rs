use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use super::badges::{AwardedBadge, Badge, BadgeEngine, BadgeKey, UserBadge};
use super::compatibility::{
    CompatibilityOptions, CompatibilityProfile, CompatibilityProfileUpdate, CompatibilityResult,
    CompatibilityScorer, SkillProfile,
};
use super::domain::{EngagementAction, UserId, UserRecord};
use super::leaderboard::{rank_users, LeaderboardEntry};
use super::repository::{
    ActivityRepository, BadgeRepository, NotificationBroadcaster, RepositoryError,
};
use crate::config::EngagementConfig;

/// Facade composing the scorer, badge engine and leaderboard for request handlers.
pub struct EngagementService<A, B, N> {
    activity: Arc<A>,
    badges: Arc<B>,
    engine: Arc<BadgeEngine<A, B, N>>,
    scorer: CompatibilityScorer,
    config: EngagementConfig,
}

impl<A, B, N> EngagementService<A, B, N>
where
    A: ActivityRepository + 'static,
    B: BadgeRepository + 'static,
    N: NotificationBroadcaster + 'static,
{
    pub fn new(activity: Arc<A>, badges: Arc<B>, notifier: Arc<N>, config: EngagementConfig) -> Self {
        let engine = Arc::new(BadgeEngine::new(
            Arc::clone(&activity),
            Arc::clone(&badges),
            notifier,
        ));

        Self {
            activity,
            badges,
            engine,
            scorer: CompatibilityScorer::default(),
            config,
        }
    }

    /// Score two inline profiles.
    pub fn compatibility<L, R>(&self, left: &L, right: &R, options: CompatibilityOptions) -> CompatibilityResult
    where
        L: SkillProfile + ?Sized,
        R: SkillProfile + ?Sized,
    {
        self.scorer.score(left, right, options)
    }

    /// Score two stored users, deriving the bonus flags from their history.
    pub async fn compatibility_between(
        &self,
        user_id: &UserId,
        other_id: &UserId,
    ) -> Result<CompatibilityResult, EngagementServiceError> {
        let (user, other, past_collab) = tokio::try_join!(
            self.require_user(user_id),
            self.require_user(other_id),
            async {
                self.activity
                    .have_collaborated(user_id, other_id)
                    .await
                    .map_err(EngagementServiceError::from)
            },
        )?;

        let similar_availability = match (&user.compatibility_profile, &other.compatibility_profile) {
            (Some(left), Some(right)) => left.shares_availability_with(right),
            _ => false,
        };
        let options = CompatibilityOptions {
            past_collab,
            similar_availability,
        };

        Ok(self
            .scorer
            .score(&user.match_profile(), &other.match_profile(), options))
    }

    /// Create the user's compatibility profile on first call, otherwise merge the update.
    ///
    /// No badge check is queued here; the HTTP handler fires the
    /// [`EngagementAction::ProfileUpdated`] hook once the save succeeds.
    pub async fn update_compatibility_profile(
        &self,
        user_id: &UserId,
        update: CompatibilityProfileUpdate,
    ) -> Result<CompatibilityProfile, EngagementServiceError> {
        self.activity
            .apply_compatibility_update(user_id, update)
            .await
            .map_err(|error| match error {
                RepositoryError::NotFound => EngagementServiceError::UnknownUser(user_id.clone()),
                other => other.into(),
            })
    }

    pub async fn leaderboard(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, EngagementServiceError> {
        let limit = self.config.effective_limit(limit);
        let mut ranking = rank_users(self.activity.list_leaderboard_inputs().await?);
        ranking.truncate(limit);
        Ok(ranking)
    }

    pub async fn badge_catalog(&self) -> Result<Vec<Badge>, EngagementServiceError> {
        Ok(self.badges.list_all_badges().await?)
    }

    pub async fn user_badges(&self, user_id: &UserId) -> Result<Vec<UserBadge>, EngagementServiceError> {
        self.require_user(user_id).await?;
        Ok(self.badges.list_user_badges(user_id).await?)
    }

    pub async fn set_badge_display(
        &self,
        user_id: &UserId,
        badge_key: &BadgeKey,
        is_displayed: bool,
    ) -> Result<UserBadge, EngagementServiceError> {
        let badge = self
            .badges
            .set_badge_display(user_id, badge_key, is_displayed)
            .await?;
        info!(%user_id, badge = %badge_key, is_displayed, "badge display toggled");
        Ok(badge)
    }

    /// Evaluate badges inline and report the awards. Never fails.
    pub async fn check_badges(
        &self,
        user_id: &UserId,
        action: EngagementAction,
        target_id: Option<&str>,
    ) -> Vec<AwardedBadge> {
        self.engine
            .check_and_award_badges(user_id, action, target_id)
            .await
    }

    /// Hook for primary actions (comment, like, project creation): queue a badge
    /// check without waiting for it.
    pub fn record_action(
        &self,
        user_id: &UserId,
        action: EngagementAction,
        target_id: Option<String>,
    ) -> JoinHandle<Vec<AwardedBadge>> {
        self.engine.spawn_check(user_id.clone(), action, target_id)
    }

    async fn require_user(&self, user_id: &UserId) -> Result<UserRecord, EngagementServiceError> {
        self.activity
            .find_user(user_id)
            .await?
            .ok_or_else(|| EngagementServiceError::UnknownUser(user_id.clone()))
    }
}

/// Error raised by the engagement service.
#[derive(Debug, thiserror::Error)]
pub enum EngagementServiceError {
    #[error("user {0} not found")]
    UnknownUser(UserId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
