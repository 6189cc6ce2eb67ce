use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use peve::config::EngagementConfig;
use peve::engagement::{
    ActivityRepository, AwardedBadge, Badge, BadgeCatalog, BadgeCatalogImporter, BadgeKey,
    BadgeRepository, CompatibilityProfile, CompatibilityProfileUpdate, ContentKind, LeaderboardInputs,
    NotificationBroadcaster, NotificationError, RepositoryError, UserBadge, UserId, UserRecord,
};
use peve::error::AppError;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Authored project, idea or comment with the engagement it has received.
#[derive(Debug, Clone)]
pub(crate) struct ContentItem {
    pub(crate) kind: ContentKind,
    pub(crate) author: UserId,
    pub(crate) likes: u64,
    pub(crate) saves: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct Collaboration {
    pub(crate) requester: UserId,
    pub(crate) owner: UserId,
    pub(crate) accepted: bool,
}

#[derive(Default)]
struct CampusTables {
    users: HashMap<UserId, UserRecord>,
    content: Vec<ContentItem>,
    votes: Vec<(UserId, String)>,
    collaborations: Vec<Collaboration>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryActivityRepository {
    tables: Arc<Mutex<CampusTables>>,
}

impl InMemoryActivityRepository {
    pub(crate) fn insert_user(&self, user: UserRecord) {
        let mut guard = self.tables.lock().expect("activity mutex poisoned");
        guard.users.insert(user.id.clone(), user);
    }

    pub(crate) fn add_content(&self, item: ContentItem) {
        let mut guard = self.tables.lock().expect("activity mutex poisoned");
        guard.content.push(item);
    }

    pub(crate) fn add_vote(&self, voter: &UserId, target_id: impl Into<String>) {
        let mut guard = self.tables.lock().expect("activity mutex poisoned");
        guard.votes.push((voter.clone(), target_id.into()));
    }

    pub(crate) fn add_collaboration(&self, collaboration: Collaboration) {
        let mut guard = self.tables.lock().expect("activity mutex poisoned");
        guard.collaborations.push(collaboration);
    }

    fn with_tables<T>(&self, read: impl FnOnce(&CampusTables) -> T) -> T {
        let guard = self.tables.lock().expect("activity mutex poisoned");
        read(&guard)
    }

    fn received(&self, user_id: &UserId, field: fn(&ContentItem) -> u64) -> u64 {
        self.with_tables(|tables| {
            tables
                .content
                .iter()
                .filter(|item| &item.author == user_id)
                .map(field)
                .sum()
        })
    }
}

fn accepted_count(tables: &CampusTables, user_id: &UserId) -> u64 {
    tables
        .collaborations
        .iter()
        .filter(|collab| {
            collab.accepted && (&collab.requester == user_id || &collab.owner == user_id)
        })
        .count() as u64
}

fn authored_count(tables: &CampusTables, user_id: &UserId, kind: ContentKind) -> u64 {
    tables
        .content
        .iter()
        .filter(|item| item.kind == kind && &item.author == user_id)
        .count() as u64
}

#[async_trait]
impl ActivityRepository for InMemoryActivityRepository {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.users.get(user_id).cloned()))
    }

    async fn count_authored(
        &self,
        user_id: &UserId,
        kind: ContentKind,
    ) -> Result<u64, RepositoryError> {
        Ok(self.with_tables(|tables| authored_count(tables, user_id, kind)))
    }

    async fn count_votes(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables.votes.iter().filter(|(voter, _)| voter == user_id).count() as u64
        }))
    }

    async fn sum_likes_received(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        Ok(self.received(user_id, |item| item.likes))
    }

    async fn sum_saves_received(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        Ok(self.received(user_id, |item| item.saves))
    }

    async fn count_accepted_collaborations(
        &self,
        user_id: &UserId,
    ) -> Result<u64, RepositoryError> {
        Ok(self.with_tables(|tables| accepted_count(tables, user_id)))
    }

    async fn have_collaborated(
        &self,
        left: &UserId,
        right: &UserId,
    ) -> Result<bool, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables.collaborations.iter().any(|collab| {
                collab.accepted
                    && ((&collab.requester == left && &collab.owner == right)
                        || (&collab.requester == right && &collab.owner == left))
            })
        }))
    }

    async fn list_leaderboard_inputs(&self) -> Result<Vec<LeaderboardInputs>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .users
                .values()
                .filter(|user| user.is_active)
                .map(|user| LeaderboardInputs {
                    user_id: user.id.clone(),
                    name: user.name.clone(),
                    ideas_count: authored_count(tables, &user.id, ContentKind::Idea),
                    projects_count: authored_count(tables, &user.id, ContentKind::Project),
                    accepted_collaborations: accepted_count(tables, &user.id),
                    connections: user.followers_count,
                })
                .collect()
        }))
    }

    async fn increment_user_points(
        &self,
        user_id: &UserId,
        delta: u32,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("activity mutex poisoned");
        let user = guard.users.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        user.points += u64::from(delta);
        Ok(())
    }

    async fn apply_compatibility_update(
        &self,
        user_id: &UserId,
        update: CompatibilityProfileUpdate,
    ) -> Result<CompatibilityProfile, RepositoryError> {
        let mut guard = self.tables.lock().expect("activity mutex poisoned");
        let user = guard.users.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        Ok(CompatibilityProfile::upsert(&mut user.compatibility_profile, update))
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryBadgeRepository {
    catalog: Arc<Vec<Badge>>,
    earned: Arc<Mutex<HashMap<(UserId, BadgeKey), UserBadge>>>,
}

impl InMemoryBadgeRepository {
    pub(crate) fn new(catalog: BadgeCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog.into_badges()),
            earned: Arc::default(),
        }
    }
}

#[async_trait]
impl BadgeRepository for InMemoryBadgeRepository {
    async fn list_active_badges(&self) -> Result<Vec<Badge>, RepositoryError> {
        Ok(self
            .catalog
            .iter()
            .filter(|badge| badge.is_active)
            .cloned()
            .collect())
    }

    async fn list_all_badges(&self) -> Result<Vec<Badge>, RepositoryError> {
        Ok(self.catalog.as_ref().clone())
    }

    async fn list_earned_badge_keys(
        &self,
        user_id: &UserId,
    ) -> Result<HashSet<BadgeKey>, RepositoryError> {
        let guard = self.earned.lock().expect("badge mutex poisoned");
        Ok(guard
            .keys()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, key)| key.clone())
            .collect())
    }

    async fn insert_user_badge_if_absent(
        &self,
        badge: UserBadge,
    ) -> Result<bool, RepositoryError> {
        let mut guard = self.earned.lock().expect("badge mutex poisoned");
        let key = (badge.user_id.clone(), badge.badge_key.clone());
        if guard.contains_key(&key) {
            return Ok(false);
        }
        guard.insert(key, badge);
        Ok(true)
    }

    async fn list_user_badges(&self, user_id: &UserId) -> Result<Vec<UserBadge>, RepositoryError> {
        let guard = self.earned.lock().expect("badge mutex poisoned");
        let mut badges: Vec<UserBadge> = guard
            .values()
            .filter(|badge| &badge.user_id == user_id)
            .cloned()
            .collect();
        badges.sort_by_key(|badge| badge.earned_at);
        Ok(badges)
    }

    async fn set_badge_display(
        &self,
        user_id: &UserId,
        badge_key: &BadgeKey,
        is_displayed: bool,
    ) -> Result<UserBadge, RepositoryError> {
        let mut guard = self.earned.lock().expect("badge mutex poisoned");
        let badge = guard
            .get_mut(&(user_id.clone(), badge_key.clone()))
            .ok_or(RepositoryError::NotFound)?;
        badge.is_displayed = is_displayed;
        Ok(badge.clone())
    }
}

/// Realtime event pushed to the recipient's channel when a badge is earned.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct BadgeEarnedEvent {
    pub(crate) user_id: UserId,
    pub(crate) badge: AwardedBadge,
    pub(crate) emitted_at: DateTime<Utc>,
}

/// Fan-out notifier standing in for the websocket hub.
#[derive(Clone)]
pub(crate) struct BroadcastNotifier {
    sender: broadcast::Sender<BadgeEarnedEvent>,
}

impl BroadcastNotifier {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<BadgeEarnedEvent> {
        self.sender.subscribe()
    }
}

impl NotificationBroadcaster for BroadcastNotifier {
    fn emit_badge_earned(
        &self,
        user_id: &UserId,
        badge: &AwardedBadge,
    ) -> Result<(), NotificationError> {
        let event = BadgeEarnedEvent {
            user_id: user_id.clone(),
            badge: badge.clone(),
            emitted_at: Utc::now(),
        };
        // An empty room is not a delivery failure; nobody is online to notify.
        if self.sender.send(event).is_err() {
            debug!(%user_id, badge = %badge.key, "no listeners for badge event");
        }
        Ok(())
    }
}

/// Load the admin CSV catalog when configured, otherwise the built-in one.
pub(crate) fn load_catalog(config: &EngagementConfig) -> Result<BadgeCatalog, AppError> {
    match &config.badge_catalog_csv {
        Some(path) => {
            let catalog = BadgeCatalogImporter::from_path(path)?;
            info!(path = %path.display(), badges = catalog.badges().len(), "badge catalog imported");
            Ok(catalog)
        }
        None => Ok(BadgeCatalog::standard()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn repository() -> InMemoryActivityRepository {
        let repository = InMemoryActivityRepository::default();
        let joined = Utc::now() - Duration::weeks(3);
        repository.insert_user(UserRecord::new("ada", "Ada", joined));
        repository.insert_user(UserRecord::new("bob", "Bob", joined));
        repository
    }

    #[tokio::test]
    async fn engagement_is_summed_across_all_authored_content() {
        let repository = repository();
        let ada = UserId::new("ada");
        for (kind, likes) in [
            (ContentKind::Project, 4),
            (ContentKind::Idea, 3),
            (ContentKind::Comment, 9),
        ] {
            repository.add_content(ContentItem {
                kind,
                author: ada.clone(),
                likes,
                saves: 1,
            });
        }

        assert_eq!(repository.sum_likes_received(&ada).await.expect("likes"), 16);
        assert_eq!(repository.sum_saves_received(&ada).await.expect("saves"), 3);
        assert_eq!(
            repository
                .count_authored(&ada, ContentKind::Comment)
                .await
                .expect("comments"),
            1
        );
    }

    #[tokio::test]
    async fn only_accepted_collaborations_count_for_both_sides() {
        let repository = repository();
        let ada = UserId::new("ada");
        let bob = UserId::new("bob");
        repository.add_collaboration(Collaboration {
            requester: bob.clone(),
            owner: ada.clone(),
            accepted: true,
        });
        repository.add_collaboration(Collaboration {
            requester: ada.clone(),
            owner: bob.clone(),
            accepted: false,
        });

        assert_eq!(
            repository
                .count_accepted_collaborations(&ada)
                .await
                .expect("count"),
            1
        );
        assert!(repository.have_collaborated(&ada, &bob).await.expect("pair"));
        assert!(!repository
            .have_collaborated(&ada, &UserId::new("cy"))
            .await
            .expect("pair"));
    }

    #[tokio::test]
    async fn broadcast_without_listeners_is_not_a_failure() {
        let notifier = BroadcastNotifier::new(8);
        let badge = AwardedBadge::from_badge(&BadgeCatalog::standard().badges()[0], Utc::now());

        notifier
            .emit_badge_earned(&UserId::new("ada"), &badge)
            .expect("nobody online is still a successful emit");

        let mut receiver = notifier.subscribe();
        notifier
            .emit_badge_earned(&UserId::new("ada"), &badge)
            .expect("delivered");
        let event = receiver.recv().await.expect("event received");
        assert_eq!(event.badge.key, badge.key);
    }
}
