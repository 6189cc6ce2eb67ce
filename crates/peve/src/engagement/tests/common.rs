use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{Duration, Utc};
use serde_json::Value;

use crate::config::EngagementConfig;
use crate::engagement::badges::{
    AwardedBadge, Badge, BadgeCategory, BadgeCriteria, BadgeEngine, BadgeKey, BadgeRarity,
    CountTarget, CustomPredicate, UserBadge,
};
use crate::engagement::compatibility::{CompatibilityProfile, CompatibilityProfileUpdate};
use crate::engagement::domain::{ContentKind, UserId, UserRecord};
use crate::engagement::leaderboard::LeaderboardInputs;
use crate::engagement::repository::{
    ActivityRepository, BadgeRepository, NotificationBroadcaster, NotificationError,
    RepositoryError,
};
use crate::engagement::service::EngagementService;

pub(super) type TestEngine = BadgeEngine<MemoryActivity, MemoryBadges, MemoryNotifier>;
pub(super) type TestService = EngagementService<MemoryActivity, MemoryBadges, MemoryNotifier>;

pub(super) fn user(id: &str, weeks_old: i64) -> UserRecord {
    UserRecord::new(id, id.to_uppercase(), Utc::now() - Duration::weeks(weeks_old))
}

pub(super) fn badge(key: &str, criteria: BadgeCriteria, points: u32) -> Badge {
    Badge {
        key: BadgeKey::new(key),
        name: key.replace('_', " "),
        description: format!("{key} description"),
        icon: "*".to_string(),
        category: BadgeCategory::Achievement,
        rarity: BadgeRarity::Common,
        criteria,
        points,
        is_active: true,
    }
}

pub(super) fn count_badge(key: &str, target: CountTarget, threshold: u64, points: u32) -> Badge {
    badge(key, BadgeCriteria::Count { target, threshold }, points)
}

pub(super) fn rank_badge(key: &str, threshold: u32, points: u32) -> Badge {
    badge(key, BadgeCriteria::Rank { threshold }, points)
}

pub(super) fn custom_badge(key: &str, predicate: &str, points: u32) -> Badge {
    badge(
        key,
        BadgeCriteria::Custom {
            predicate: CustomPredicate::parse(predicate),
        },
        points,
    )
}

pub(super) fn keys(awarded: &[AwardedBadge]) -> Vec<&str> {
    awarded.iter().map(|badge| badge.key.as_str()).collect()
}

pub(super) fn build_engine(
    catalog: Vec<Badge>,
) -> (
    Arc<TestEngine>,
    Arc<MemoryActivity>,
    Arc<MemoryBadges>,
    Arc<MemoryNotifier>,
) {
    let activity = Arc::new(MemoryActivity::default());
    let badges = Arc::new(MemoryBadges::with_catalog(catalog));
    let notifier = Arc::new(MemoryNotifier::default());
    let engine = Arc::new(BadgeEngine::new(
        activity.clone(),
        badges.clone(),
        notifier.clone(),
    ));
    (engine, activity, badges, notifier)
}

pub(super) fn build_service(
    catalog: Vec<Badge>,
) -> (TestService, Arc<MemoryActivity>, Arc<MemoryBadges>) {
    let activity = Arc::new(MemoryActivity::default());
    let badges = Arc::new(MemoryBadges::with_catalog(catalog));
    let notifier = Arc::new(MemoryNotifier::default());
    let service = EngagementService::new(
        activity.clone(),
        badges.clone(),
        notifier,
        EngagementConfig::default(),
    );
    (service, activity, badges)
}

#[derive(Debug, Default, Clone, Copy)]
pub(super) struct ActivityCounts {
    pub(super) projects: u64,
    pub(super) ideas: u64,
    pub(super) comments: u64,
    pub(super) votes: u64,
    pub(super) collaborations: u64,
    pub(super) likes: u64,
    pub(super) saves: u64,
}

#[derive(Default)]
pub(super) struct MemoryActivity {
    users: Mutex<HashMap<UserId, UserRecord>>,
    counts: Mutex<HashMap<UserId, ActivityCounts>>,
    partners: Mutex<HashSet<(UserId, UserId)>>,
    pub(super) fail_reads: AtomicBool,
    pub(super) fail_points: AtomicBool,
}

impl MemoryActivity {
    pub(super) fn add_user(&self, user: UserRecord) {
        self.users
            .lock()
            .expect("users mutex poisoned")
            .insert(user.id.clone(), user);
    }

    pub(super) fn set_counts(&self, user_id: &str, counts: ActivityCounts) {
        self.counts
            .lock()
            .expect("counts mutex poisoned")
            .insert(UserId::new(user_id), counts);
    }

    pub(super) fn link_collaborators(&self, left: &str, right: &str) {
        self.partners
            .lock()
            .expect("partners mutex poisoned")
            .insert((UserId::new(left), UserId::new(right)));
    }

    pub(super) fn points(&self, user_id: &str) -> u64 {
        self.users
            .lock()
            .expect("users mutex poisoned")
            .get(&UserId::new(user_id))
            .map(|user| user.points)
            .unwrap_or_default()
    }

    pub(super) fn stored_user(&self, user_id: &str) -> Option<UserRecord> {
        self.users
            .lock()
            .expect("users mutex poisoned")
            .get(&UserId::new(user_id))
            .cloned()
    }

    fn counts_for(&self, user_id: &UserId) -> Result<ActivityCounts, RepositoryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("activity store offline".to_string()));
        }
        Ok(self
            .counts
            .lock()
            .expect("counts mutex poisoned")
            .get(user_id)
            .copied()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ActivityRepository for MemoryActivity {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .expect("users mutex poisoned")
            .get(user_id)
            .cloned())
    }

    async fn count_authored(
        &self,
        user_id: &UserId,
        kind: ContentKind,
    ) -> Result<u64, RepositoryError> {
        let counts = self.counts_for(user_id)?;
        Ok(match kind {
            ContentKind::Project => counts.projects,
            ContentKind::Idea => counts.ideas,
            ContentKind::Comment => counts.comments,
        })
    }

    async fn count_votes(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        Ok(self.counts_for(user_id)?.votes)
    }

    async fn sum_likes_received(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        Ok(self.counts_for(user_id)?.likes)
    }

    async fn sum_saves_received(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        Ok(self.counts_for(user_id)?.saves)
    }

    async fn count_accepted_collaborations(
        &self,
        user_id: &UserId,
    ) -> Result<u64, RepositoryError> {
        Ok(self.counts_for(user_id)?.collaborations)
    }

    async fn have_collaborated(
        &self,
        left: &UserId,
        right: &UserId,
    ) -> Result<bool, RepositoryError> {
        let partners = self.partners.lock().expect("partners mutex poisoned");
        Ok(partners.contains(&(left.clone(), right.clone()))
            || partners.contains(&(right.clone(), left.clone())))
    }

    async fn list_leaderboard_inputs(&self) -> Result<Vec<LeaderboardInputs>, RepositoryError> {
        let users: Vec<UserRecord> = self
            .users
            .lock()
            .expect("users mutex poisoned")
            .values()
            .filter(|user| user.is_active)
            .cloned()
            .collect();

        users
            .into_iter()
            .map(|user| {
                let counts = self.counts_for(&user.id)?;
                Ok(LeaderboardInputs {
                    user_id: user.id,
                    name: user.name,
                    ideas_count: counts.ideas,
                    projects_count: counts.projects,
                    accepted_collaborations: counts.collaborations,
                    connections: user.followers_count,
                })
            })
            .collect()
    }

    async fn increment_user_points(
        &self,
        user_id: &UserId,
        delta: u32,
    ) -> Result<(), RepositoryError> {
        if self.fail_points.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("points ledger offline".to_string()));
        }
        let mut users = self.users.lock().expect("users mutex poisoned");
        let user = users.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        user.points += u64::from(delta);
        Ok(())
    }

    async fn apply_compatibility_update(
        &self,
        user_id: &UserId,
        update: CompatibilityProfileUpdate,
    ) -> Result<CompatibilityProfile, RepositoryError> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        let user = users.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        Ok(CompatibilityProfile::upsert(&mut user.compatibility_profile, update))
    }
}

#[derive(Default)]
pub(super) struct MemoryBadges {
    catalog: Vec<Badge>,
    earned: Mutex<HashMap<(UserId, BadgeKey), UserBadge>>,
}

impl MemoryBadges {
    pub(super) fn with_catalog(catalog: Vec<Badge>) -> Self {
        Self {
            catalog,
            earned: Mutex::default(),
        }
    }

    pub(super) fn rows_for(&self, user_id: &str) -> usize {
        let user_id = UserId::new(user_id);
        self.earned
            .lock()
            .expect("earned mutex poisoned")
            .keys()
            .filter(|(owner, _)| owner == &user_id)
            .count()
    }
}

#[async_trait]
impl BadgeRepository for MemoryBadges {
    async fn list_active_badges(&self) -> Result<Vec<Badge>, RepositoryError> {
        Ok(self
            .catalog
            .iter()
            .filter(|badge| badge.is_active)
            .cloned()
            .collect())
    }

    async fn list_all_badges(&self) -> Result<Vec<Badge>, RepositoryError> {
        Ok(self.catalog.clone())
    }

    async fn list_earned_badge_keys(
        &self,
        user_id: &UserId,
    ) -> Result<HashSet<BadgeKey>, RepositoryError> {
        Ok(self
            .earned
            .lock()
            .expect("earned mutex poisoned")
            .keys()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, key)| key.clone())
            .collect())
    }

    async fn insert_user_badge_if_absent(
        &self,
        badge: UserBadge,
    ) -> Result<bool, RepositoryError> {
        let mut earned = self.earned.lock().expect("earned mutex poisoned");
        let key = (badge.user_id.clone(), badge.badge_key.clone());
        if earned.contains_key(&key) {
            return Ok(false);
        }
        earned.insert(key, badge);
        Ok(true)
    }

    async fn list_user_badges(&self, user_id: &UserId) -> Result<Vec<UserBadge>, RepositoryError> {
        let mut badges: Vec<UserBadge> = self
            .earned
            .lock()
            .expect("earned mutex poisoned")
            .values()
            .filter(|badge| &badge.user_id == user_id)
            .cloned()
            .collect();
        badges.sort_by(|left, right| left.badge_key.cmp(&right.badge_key));
        Ok(badges)
    }

    async fn set_badge_display(
        &self,
        user_id: &UserId,
        badge_key: &BadgeKey,
        is_displayed: bool,
    ) -> Result<UserBadge, RepositoryError> {
        let mut earned = self.earned.lock().expect("earned mutex poisoned");
        let badge = earned
            .get_mut(&(user_id.clone(), badge_key.clone()))
            .ok_or(RepositoryError::NotFound)?;
        badge.is_displayed = is_displayed;
        Ok(badge.clone())
    }
}

/// Badge store where another writer always wins the insert race.
pub(super) struct LosingRaceBadges {
    pub(super) catalog: Vec<Badge>,
}

#[async_trait]
impl BadgeRepository for LosingRaceBadges {
    async fn list_active_badges(&self) -> Result<Vec<Badge>, RepositoryError> {
        Ok(self.catalog.clone())
    }

    async fn list_all_badges(&self) -> Result<Vec<Badge>, RepositoryError> {
        Ok(self.catalog.clone())
    }

    async fn list_earned_badge_keys(
        &self,
        _user_id: &UserId,
    ) -> Result<HashSet<BadgeKey>, RepositoryError> {
        Ok(HashSet::new())
    }

    async fn insert_user_badge_if_absent(
        &self,
        _badge: UserBadge,
    ) -> Result<bool, RepositoryError> {
        Ok(false)
    }

    async fn list_user_badges(&self, _user_id: &UserId) -> Result<Vec<UserBadge>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn set_badge_display(
        &self,
        _user_id: &UserId,
        _badge_key: &BadgeKey,
        _is_displayed: bool,
    ) -> Result<UserBadge, RepositoryError> {
        Err(RepositoryError::NotFound)
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    events: Mutex<Vec<(UserId, BadgeKey)>>,
    pub(super) offline: AtomicBool,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<(UserId, BadgeKey)> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationBroadcaster for MemoryNotifier {
    fn emit_badge_earned(
        &self,
        user_id: &UserId,
        badge: &AwardedBadge,
    ) -> Result<(), NotificationError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(NotificationError::Transport("socket hub down".to_string()));
        }
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push((user_id.clone(), badge.key.clone()));
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
