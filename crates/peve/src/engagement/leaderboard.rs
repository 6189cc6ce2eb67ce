//! The overall engagement score and the ranking derived from it.
//!
//! Rank badges and the public leaderboard both go through [`rank_users`], so the
//! score law lives in exactly one place.

use serde::{Deserialize, Serialize};

use super::domain::UserId;

pub const IDEA_WEIGHT: u64 = 10;
pub const PROJECT_WEIGHT: u64 = 50;
pub const COLLABORATION_WEIGHT: u64 = 30;
pub const CONNECTION_WEIGHT: u64 = 10;

/// Per-user counters feeding the overall score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardInputs {
    pub user_id: UserId,
    pub name: String,
    pub ideas_count: u64,
    pub projects_count: u64,
    pub accepted_collaborations: u64,
    /// Follower count.
    pub connections: u64,
}

pub fn overall_score(inputs: &LeaderboardInputs) -> u64 {
    inputs.ideas_count * IDEA_WEIGHT
        + inputs.projects_count * PROJECT_WEIGHT
        + inputs.accepted_collaborations * COLLABORATION_WEIGHT
        + inputs.connections * CONNECTION_WEIGHT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: UserId,
    pub name: String,
    pub score: u64,
    pub ideas_count: u64,
    pub projects_count: u64,
    pub accepted_collaborations: u64,
    pub connections: u64,
}

/// Order users by overall score, highest first. Ties fall back to user id so the
/// ranking is stable between calls. Ranks are 1-based.
pub fn rank_users(inputs: Vec<LeaderboardInputs>) -> Vec<LeaderboardEntry> {
    let mut scored: Vec<(u64, LeaderboardInputs)> = inputs
        .into_iter()
        .map(|entry| (overall_score(&entry), entry))
        .collect();
    scored.sort_by(|(left_score, left), (right_score, right)| {
        right_score
            .cmp(left_score)
            .then_with(|| left.user_id.cmp(&right.user_id))
    });

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (score, entry))| LeaderboardEntry {
            rank: index + 1,
            user_id: entry.user_id,
            name: entry.name,
            score,
            ideas_count: entry.ideas_count,
            projects_count: entry.projects_count,
            accepted_collaborations: entry.accepted_collaborations,
            connections: entry.connections,
        })
        .collect()
}

pub fn rank_of(user_id: &UserId, ranking: &[LeaderboardEntry]) -> Option<usize> {
    ranking
        .iter()
        .find(|entry| &entry.user_id == user_id)
        .map(|entry| entry.rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(id: &str, ideas: u64, projects: u64, collabs: u64, connections: u64) -> LeaderboardInputs {
        LeaderboardInputs {
            user_id: UserId::new(id),
            name: id.to_uppercase(),
            ideas_count: ideas,
            projects_count: projects,
            accepted_collaborations: collabs,
            connections,
        }
    }

    #[test]
    fn overall_score_weights_each_counter() {
        assert_eq!(overall_score(&inputs("a", 3, 2, 1, 4)), 30 + 100 + 30 + 40);
        assert_eq!(overall_score(&inputs("b", 0, 0, 0, 0)), 0);
    }

    #[test]
    fn ranks_descending_with_stable_ties() {
        let ranking = rank_users(vec![
            inputs("carol", 1, 0, 0, 0),
            inputs("bob", 0, 1, 0, 0),
            inputs("alice", 1, 0, 0, 0),
        ]);

        let order: Vec<&str> = ranking.iter().map(|entry| entry.user_id.as_str()).collect();
        assert_eq!(order, vec!["bob", "alice", "carol"]);
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[0].score, 50);
        assert_eq!(rank_of(&UserId::new("carol"), &ranking), Some(3));
        assert_eq!(rank_of(&UserId::new("dave"), &ranking), None);
    }
}
