use super::domain::{BadgeCriteria, CountTarget, CustomPredicate};
use crate::engagement::stats::UserStatsSnapshot;

/// Decide whether a criterion is met. `rank` is the user's current 1-based
/// leaderboard position, `None` when it was not computed or the user is unranked.
pub(crate) fn qualifies(
    criteria: &BadgeCriteria,
    stats: &UserStatsSnapshot,
    rank: Option<usize>,
) -> bool {
    match criteria {
        BadgeCriteria::Count { target, threshold } => {
            count_for(*target, stats).is_some_and(|count| count >= *threshold)
        }
        BadgeCriteria::Rank { threshold } => {
            rank.is_some_and(|rank| rank <= *threshold as usize)
        }
        BadgeCriteria::Custom { predicate } => predicate_holds(predicate, stats),
        BadgeCriteria::Unsupported => false,
    }
}

pub(crate) fn count_for(target: CountTarget, stats: &UserStatsSnapshot) -> Option<u64> {
    match target {
        CountTarget::Projects => Some(stats.projects_count),
        CountTarget::Ideas => Some(stats.ideas_count),
        CountTarget::Comments => Some(stats.comments_count),
        CountTarget::LikesReceived => Some(stats.likes_received),
        CountTarget::SavesReceived => Some(stats.saves_received),
        CountTarget::Votes => Some(stats.votes_count),
        CountTarget::Collaborations => Some(stats.collaborations_count),
        CountTarget::Skills => Some(stats.skills_count),
        CountTarget::Unsupported => None,
    }
}

fn predicate_holds(predicate: &CustomPredicate, stats: &UserStatsSnapshot) -> bool {
    match predicate {
        CustomPredicate::AccountAgeWeeks(weeks) => stats.account_age_weeks >= *weeks,
        CustomPredicate::ProfileCompletion(percent) => stats.profile_completion >= *percent,
        CustomPredicate::EarlyAdopter => stats.is_early_adopter,
        CustomPredicate::BetaTester => stats.is_beta_tester,
        CustomPredicate::Unrecognized(_) => false,
    }
}
