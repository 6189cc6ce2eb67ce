use crate::infra::{
    BroadcastNotifier, Collaboration, ContentItem, InMemoryActivityRepository,
    InMemoryBadgeRepository,
};
use chrono::{Duration, Utc};
use clap::Args;
use peve::config::EngagementConfig;
use peve::engagement::{
    compute_compatibility, Badge, BadgeCatalog, BadgeCatalogImporter, BadgeCriteria,
    CompatibilityOptions, CompatibilityProfileUpdate, ContentKind, EngagementAction,
    EngagementService, MatchProfile, UserId, UserRecord,
};
use peve::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct BadgeListArgs {
    /// Admin CSV export to validate and list instead of the standard catalog
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CompatibilityArgs {
    /// Comma separated skills of the first profile
    #[arg(long, value_delimiter = ',')]
    pub(crate) skills_a: Vec<String>,
    /// Comma separated skills of the second profile
    #[arg(long, value_delimiter = ',')]
    pub(crate) skills_b: Vec<String>,
    /// Comma separated interests of the first profile
    #[arg(long, value_delimiter = ',')]
    pub(crate) interests_a: Vec<String>,
    /// Comma separated interests of the second profile
    #[arg(long, value_delimiter = ',')]
    pub(crate) interests_b: Vec<String>,
    /// The two users already completed a collaboration
    #[arg(long)]
    pub(crate) past_collab: bool,
    /// The two users work in the same time zone
    #[arg(long)]
    pub(crate) similar_availability: bool,
    /// Print the raw JSON result
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_badge_listing(args: BadgeListArgs) -> Result<(), AppError> {
    let (catalog, source) = match args.csv {
        Some(path) => {
            let catalog = BadgeCatalogImporter::from_path(&path)?;
            (catalog, path.display().to_string())
        }
        None => (BadgeCatalog::standard(), "standard catalog".to_string()),
    };

    println!("{} badges from {}", catalog.badges().len(), source);
    for badge in catalog.badges() {
        println!("{}", describe_badge(badge));
    }
    Ok(())
}

pub(crate) fn run_compatibility(args: CompatibilityArgs) -> Result<(), AppError> {
    let left = MatchProfile::new(args.skills_a, args.interests_a);
    let right = MatchProfile::new(args.skills_b, args.interests_b);
    let options = CompatibilityOptions {
        past_collab: args.past_collab,
        similar_availability: args.similar_availability,
    };

    let result = compute_compatibility(&left, &right, options);
    if args.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Result unavailable as JSON: {err}"),
        }
        return Ok(());
    }

    println!("{} ({})", result.score, result.label.as_str());
    println!(
        "- skill overlap {:.2} | interest overlap {:.2} | bonuses {:.2}",
        result.breakdown.skill_overlap,
        result.breakdown.interest_overlap,
        result.breakdown.past_collab_bonus + result.breakdown.time_availability_bonus
    );
    if result.reasons.is_empty() {
        println!("- no shared ground yet");
    } else {
        println!("- {}", result.reasons.join(", "));
    }
    Ok(())
}

pub(crate) async fn run_demo() -> Result<(), AppError> {
    println!("peve engagement demo");

    let activity = Arc::new(InMemoryActivityRepository::default());
    let notifier = BroadcastNotifier::new(64);
    let mut events = notifier.subscribe();
    let service = EngagementService::new(
        activity.clone(),
        Arc::new(InMemoryBadgeRepository::new(BadgeCatalog::standard())),
        Arc::new(notifier),
        EngagementConfig::default(),
    );

    seed_campus(&activity);
    let ada = UserId::new("ada");
    let bob = UserId::new("bob");
    let cy = UserId::new("cy");

    println!("\nCompatibility setup");
    for (user_id, skills, interests) in [
        (&ada, vec!["Rust", "React", "Postgres"], vec!["EdTech", "Climate"]),
        (&bob, vec!["react", "Node", "Postgres"], vec!["edtech"]),
    ] {
        let update = CompatibilityProfileUpdate {
            skills: Some(skills.into_iter().map(String::from).collect()),
            interests: Some(interests.into_iter().map(String::from).collect()),
            time_zone: Some("America/Chicago".to_string()),
            ..CompatibilityProfileUpdate::default()
        };
        match service.update_compatibility_profile(user_id, update).await {
            Ok(profile) => println!(
                "- saved profile for {user_id}: {} skills, {} interests",
                profile.skills.len(),
                profile.interests.len()
            ),
            Err(err) => println!("- profile for {user_id} rejected: {err}"),
        }
    }

    match service.compatibility_between(&ada, &bob).await {
        Ok(result) => println!(
            "- ada x bob: {} ({}) because {}",
            result.score,
            result.label.as_str(),
            result.reasons.join(", ")
        ),
        Err(err) => println!("- ada x bob unavailable: {err}"),
    }

    println!("\nBadge checks");
    for (user_id, action) in [
        (&ada, EngagementAction::ProjectCreated),
        (&bob, EngagementAction::CollaborationAccepted),
        (&cy, EngagementAction::CommentCreated),
    ] {
        let awarded = service.check_badges(user_id, action, None).await;
        let points: u64 = awarded.iter().map(|badge| u64::from(badge.points)).sum();
        println!(
            "- {user_id} ({}): {} new badges, +{points} points",
            action.label(),
            awarded.len()
        );
        for badge in &awarded {
            println!("    {} {} ({:?})", badge.icon, badge.name, badge.rarity);
        }
    }

    let repeat = service
        .check_badges(&ada, EngagementAction::ProjectCreated, None)
        .await;
    println!("- repeat check for ada awarded {} badges", repeat.len());

    println!("\nLeaderboard");
    match service.leaderboard(Some(5)).await {
        Ok(entries) => {
            for entry in entries {
                println!(
                    "  #{} {} - {} pts ({} projects, {} ideas, {} collaborations, {} followers)",
                    entry.rank,
                    entry.name,
                    entry.score,
                    entry.projects_count,
                    entry.ideas_count,
                    entry.accepted_collaborations,
                    entry.connections
                );
            }
        }
        Err(err) => println!("  Leaderboard unavailable: {err}"),
    }

    let mut delivered = 0;
    while events.try_recv().is_ok() {
        delivered += 1;
    }
    println!("\nRealtime badge events dispatched: {delivered}");

    Ok(())
}

pub(crate) fn seed_campus(activity: &InMemoryActivityRepository) {
    let now = Utc::now();

    let mut ada = UserRecord::new("ada", "Ada Okafor", now - Duration::weeks(60));
    ada.bio = Some("Builds tools for study groups".to_string());
    ada.skills = vec!["Rust".to_string(), "React".to_string(), "Postgres".to_string()];
    ada.github = Some("ada-okafor".to_string());
    ada.is_early_adopter = true;
    ada.followers_count = 12;

    let mut bob = UserRecord::new("bob", "Bob Lindqvist", now - Duration::weeks(20));
    bob.skills = vec!["React".to_string(), "Node".to_string()];
    bob.is_beta_tester = true;
    bob.followers_count = 4;

    let cy = UserRecord::new("cy", "Cy Tan", now - Duration::weeks(2));

    let ada_id = ada.id.clone();
    let bob_id = bob.id.clone();
    let cy_id = cy.id.clone();
    for user in [ada, bob, cy] {
        activity.insert_user(user);
    }

    for (author, kind, likes, saves) in [
        (&ada_id, ContentKind::Project, 18, 6),
        (&ada_id, ContentKind::Project, 9, 5),
        (&ada_id, ContentKind::Idea, 3, 0),
        (&bob_id, ContentKind::Idea, 7, 2),
        (&bob_id, ContentKind::Idea, 1, 0),
        (&cy_id, ContentKind::Comment, 0, 0),
    ] {
        activity.add_content(ContentItem {
            kind,
            author: author.clone(),
            likes,
            saves,
        });
    }

    activity.add_collaboration(Collaboration {
        requester: bob_id.clone(),
        owner: ada_id.clone(),
        accepted: true,
    });
    activity.add_collaboration(Collaboration {
        requester: cy_id.clone(),
        owner: ada_id,
        accepted: false,
    });

    for target in ["p-1", "p-2", "i-7"] {
        activity.add_vote(&cy_id, target);
    }
    activity.add_vote(&bob_id, "p-1");
}

fn describe_badge(badge: &Badge) -> String {
    let rule = match &badge.criteria {
        BadgeCriteria::Count { target, threshold } => format!("{target:?} >= {threshold}"),
        BadgeCriteria::Rank { threshold } => format!("leaderboard rank <= {threshold}"),
        BadgeCriteria::Custom { predicate } => predicate.to_string(),
        BadgeCriteria::Unsupported => "unsupported rule".to_string(),
    };
    let status = if badge.is_active { "" } else { " [inactive]" };

    format!(
        "  {} {:<22} {:?}/{:?} {:>4} pts  {}{}",
        badge.icon, badge.key.as_str(), badge.category, badge.rarity, badge.points, rule, status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use peve::engagement::{BadgeKey, CountTarget};

    #[test]
    fn describe_badge_renders_rule_and_status() {
        let catalog = BadgeCatalog::standard();
        let top_ten = catalog
            .get(&BadgeKey::new("top_ten"))
            .expect("standard badge");
        assert!(describe_badge(top_ten).contains("leaderboard rank <= 10"));

        let mut retired = top_ten.clone();
        retired.is_active = false;
        retired.criteria = BadgeCriteria::Count {
            target: CountTarget::Votes,
            threshold: 3,
        };
        let line = describe_badge(&retired);
        assert!(line.contains("Votes >= 3"));
        assert!(line.ends_with("[inactive]"));
    }

    #[tokio::test]
    async fn demo_runs_against_seeded_campus() {
        run_demo().await.expect("demo completes");
    }
}
