use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::domain::{AwardedBadge, Badge, UserBadge};
use super::rules;
use crate::engagement::domain::{EngagementAction, UserId};
use crate::engagement::leaderboard::{rank_of, rank_users};
use crate::engagement::repository::{
    ActivityRepository, BadgeRepository, NotificationBroadcaster, NotificationError,
    RepositoryError,
};
use crate::engagement::stats::StatsAggregator;

/// Evaluates the active catalog for a user and records newly earned badges.
///
/// Awarding is best effort: [`BadgeEngine::check_and_award_badges`] never returns an
/// error, and duplicate awards are prevented solely by the repository's
/// compare-and-insert.
pub struct BadgeEngine<A, B, N> {
    activity: Arc<A>,
    badges: Arc<B>,
    notifier: Arc<N>,
    stats: StatsAggregator<A>,
}

#[derive(Debug, thiserror::Error)]
enum AwardError {
    #[error("user {0} not found")]
    UnknownUser(UserId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

impl<A, B, N> BadgeEngine<A, B, N>
where
    A: ActivityRepository + 'static,
    B: BadgeRepository + 'static,
    N: NotificationBroadcaster + 'static,
{
    pub fn new(activity: Arc<A>, badges: Arc<B>, notifier: Arc<N>) -> Self {
        let stats = StatsAggregator::new(Arc::clone(&activity));
        Self {
            activity,
            badges,
            notifier,
            stats,
        }
    }

    /// Award every active badge the user newly qualifies for.
    ///
    /// Any failure, a dropped notification included, is logged and ends the run.
    /// Badges fully awarded before the failure are still returned.
    pub async fn check_and_award_badges(
        &self,
        user_id: &UserId,
        action: EngagementAction,
        target_id: Option<&str>,
    ) -> Vec<AwardedBadge> {
        let mut awarded = Vec::new();

        if let Err(error) = self.award_pending(user_id, &mut awarded).await {
            warn!(
                %user_id,
                action = action.label(),
                target_id,
                awarded = awarded.len(),
                %error,
                "badge evaluation stopped early"
            );
        } else {
            debug!(
                %user_id,
                action = action.label(),
                target_id,
                awarded = awarded.len(),
                "badge evaluation complete"
            );
        }

        awarded
    }

    /// Run a check on a detached task so the triggering request never waits on it.
    pub fn spawn_check(
        self: &Arc<Self>,
        user_id: UserId,
        action: EngagementAction,
        target_id: Option<String>,
    ) -> JoinHandle<Vec<AwardedBadge>> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine
                .check_and_award_badges(&user_id, action, target_id.as_deref())
                .await
        })
    }

    async fn award_pending(
        &self,
        user_id: &UserId,
        awarded: &mut Vec<AwardedBadge>,
    ) -> Result<(), AwardError> {
        let user = self
            .activity
            .find_user(user_id)
            .await?
            .ok_or_else(|| AwardError::UnknownUser(user_id.clone()))?;

        let catalog = self.badges.list_active_badges().await?;
        let now = Utc::now();
        let (stats, held) = tokio::try_join!(
            self.stats.snapshot(&user, now),
            self.badges.list_earned_badge_keys(user_id),
        )?;

        let pending: Vec<&Badge> = catalog
            .iter()
            .filter(|badge| badge.is_active && !held.contains(&badge.key))
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let rank = if pending.iter().any(|badge| badge.criteria.is_rank()) {
            let ranking = rank_users(self.activity.list_leaderboard_inputs().await?);
            rank_of(user_id, &ranking)
        } else {
            None
        };

        for badge in pending {
            if !rules::qualifies(&badge.criteria, &stats, rank) {
                continue;
            }

            let record = UserBadge::earned(user_id.clone(), badge, now);
            if !self.badges.insert_user_badge_if_absent(record).await? {
                debug!(%user_id, badge = %badge.key, "badge already recorded by a concurrent check");
                continue;
            }

            self.activity
                .increment_user_points(user_id, badge.points)
                .await?;

            let earned = AwardedBadge::from_badge(badge, now);
            self.notifier.emit_badge_earned(user_id, &earned)?;

            info!(%user_id, badge = %badge.key, points = badge.points, "badge awarded");
            awarded.push(earned);
        }

        Ok(())
    }
}
