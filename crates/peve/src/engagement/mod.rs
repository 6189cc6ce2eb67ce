//! Engagement core: compatibility scoring, badge awards and the leaderboard.

pub mod badges;
pub mod compatibility;
pub mod domain;
pub mod leaderboard;
pub mod repository;
pub mod router;
pub mod service;
pub mod stats;

#[cfg(test)]
mod tests;

pub use badges::{
    AwardedBadge, Badge, BadgeCatalog, BadgeCatalogImporter, BadgeCategory, BadgeCriteria,
    BadgeEngine, BadgeKey, BadgeRarity, CatalogImportError, CountTarget, CustomPredicate,
    UserBadge,
};
pub use compatibility::{
    compute_compatibility, CompatibilityOptions, CompatibilityProfile,
    CompatibilityProfileUpdate, CompatibilityResult, CompatibilityScorer, MatchLabel,
    MatchProfile,
};
pub use domain::{ContentKind, EngagementAction, UserId, UserRecord};
pub use leaderboard::{overall_score, rank_users, LeaderboardEntry, LeaderboardInputs};
pub use repository::{
    ActivityRepository, BadgeRepository, NotificationBroadcaster, NotificationError,
    RepositoryError,
};
pub use router::engagement_router;
pub use service::{EngagementService, EngagementServiceError};
pub use stats::{StatsAggregator, UserStatsSnapshot};
