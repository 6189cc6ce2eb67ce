use std::collections::HashSet;

use async_trait::async_trait;

use super::badges::{AwardedBadge, Badge, BadgeKey, UserBadge};
use super::compatibility::{CompatibilityProfile, CompatibilityProfileUpdate};
use super::domain::{ContentKind, UserId, UserRecord};
use super::leaderboard::LeaderboardInputs;

/// Read access to users and their authored activity, plus the two user-owned
/// fields the engagement core writes (points and compatibility profile).
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, RepositoryError>;

    async fn count_authored(
        &self,
        user_id: &UserId,
        kind: ContentKind,
    ) -> Result<u64, RepositoryError>;

    async fn count_votes(&self, user_id: &UserId) -> Result<u64, RepositoryError>;

    /// Likes summed across every project, idea and comment the user authored.
    async fn sum_likes_received(&self, user_id: &UserId) -> Result<u64, RepositoryError>;

    /// Saves summed across every project, idea and comment the user authored.
    async fn sum_saves_received(&self, user_id: &UserId) -> Result<u64, RepositoryError>;

    /// Accepted collaboration requests where the user is requester or owner.
    async fn count_accepted_collaborations(&self, user_id: &UserId)
        -> Result<u64, RepositoryError>;

    async fn have_collaborated(&self, left: &UserId, right: &UserId)
        -> Result<bool, RepositoryError>;

    /// Score inputs for every active user.
    async fn list_leaderboard_inputs(&self) -> Result<Vec<LeaderboardInputs>, RepositoryError>;

    async fn increment_user_points(&self, user_id: &UserId, delta: u32)
        -> Result<(), RepositoryError>;

    /// Create or merge the user's compatibility profile as one atomic step, so
    /// concurrent partial updates to different fields both land.
    async fn apply_compatibility_update(
        &self,
        user_id: &UserId,
        update: CompatibilityProfileUpdate,
    ) -> Result<CompatibilityProfile, RepositoryError>;
}

/// Badge catalog and earned-badge storage.
#[async_trait]
pub trait BadgeRepository: Send + Sync {
    async fn list_active_badges(&self) -> Result<Vec<Badge>, RepositoryError>;

    async fn list_all_badges(&self) -> Result<Vec<Badge>, RepositoryError>;

    async fn list_earned_badge_keys(
        &self,
        user_id: &UserId,
    ) -> Result<HashSet<BadgeKey>, RepositoryError>;

    /// Compare-and-insert under the unique `(user_id, badge_key)` constraint.
    /// Returns `false` when the row already exists.
    async fn insert_user_badge_if_absent(&self, badge: UserBadge)
        -> Result<bool, RepositoryError>;

    async fn list_user_badges(&self, user_id: &UserId) -> Result<Vec<UserBadge>, RepositoryError>;

    async fn set_badge_display(
        &self,
        user_id: &UserId,
        badge_key: &BadgeKey,
        is_displayed: bool,
    ) -> Result<UserBadge, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound real-time notification hook (socket rooms, push, e-mail).
///
/// Delivery is fire-and-forget: implementations must not block on subscribers.
pub trait NotificationBroadcaster: Send + Sync {
    fn emit_badge_earned(&self, user_id: &UserId, badge: &AwardedBadge)
        -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
