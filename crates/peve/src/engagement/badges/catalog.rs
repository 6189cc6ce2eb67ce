use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use super::domain::{
    Badge, BadgeCategory, BadgeCriteria, BadgeKey, BadgeRarity, CountTarget, CustomPredicate,
};

/// Ordered, key-unique set of badge definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeCatalog {
    badges: Vec<Badge>,
}

impl BadgeCatalog {
    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn into_badges(self) -> Vec<Badge> {
        self.badges
    }

    pub fn get(&self, key: &BadgeKey) -> Option<&Badge> {
        self.badges.iter().find(|badge| &badge.key == key)
    }

    /// Canonical catalog shipped with the service.
    pub fn standard() -> Self {
        use BadgeCategory::*;
        use BadgeRarity::*;

        let count = |target, threshold| BadgeCriteria::Count { target, threshold };
        let custom = |raw: &str| BadgeCriteria::Custom {
            predicate: CustomPredicate::parse(raw),
        };

        let badges = vec![
            seed("first_project", "First Launch", "Published your first project", "🚀", Achievement, Common, count(CountTarget::Projects, 1), 10),
            seed("project_builder", "Project Builder", "Published five projects", "🛠️", Milestone, Rare, count(CountTarget::Projects, 5), 50),
            seed("idea_spark", "Idea Spark", "Shared your first idea", "💡", Achievement, Common, count(CountTarget::Ideas, 1), 10),
            seed("idea_machine", "Idea Machine", "Shared ten ideas", "🧠", Milestone, Rare, count(CountTarget::Ideas, 10), 50),
            seed("conversation_starter", "Conversation Starter", "Left your first comment", "💬", Social, Common, count(CountTarget::Comments, 1), 5),
            seed("community_voice", "Community Voice", "Left fifty comments", "📣", Social, Rare, count(CountTarget::Comments, 50), 40),
            seed("crowd_favorite", "Crowd Favorite", "Received twenty-five likes", "❤️", Social, Rare, count(CountTarget::LikesReceived, 25), 40),
            seed("bookmark_worthy", "Bookmark Worthy", "Your work was saved ten times", "🔖", Social, Common, count(CountTarget::SavesReceived, 10), 25),
            seed("civic_voter", "Civic Voter", "Cast twenty votes", "🗳️", Social, Common, count(CountTarget::Votes, 20), 15),
            seed("team_player", "Team Player", "Completed your first collaboration", "🤝", Social, Common, count(CountTarget::Collaborations, 1), 20),
            seed("dream_team", "Dream Team", "Completed five collaborations", "🌟", Social, Epic, count(CountTarget::Collaborations, 5), 75),
            seed("polyglot", "Polyglot", "Listed five distinct skills", "🧩", Technical, Common, count(CountTarget::Skills, 5), 15),
            seed("top_ten", "Top Ten", "Reached the top ten of the leaderboard", "🏅", Special, Epic, BadgeCriteria::Rank { threshold: 10 }, 100),
            seed("campus_champion", "Campus Champion", "Ranked first on the leaderboard", "🏆", Special, Legendary, BadgeCriteria::Rank { threshold: 1 }, 250),
            seed("one_year_club", "One Year Club", "Member for a full year", "🎂", Milestone, Rare, custom("account_age_weeks >= 52"), 50),
            seed("complete_profile", "All Set", "Filled in every profile field", "✅", Achievement, Common, custom("profile_completion >= 100"), 15),
            seed("early_adopter", "Early Adopter", "Joined during the launch semester", "🌱", Special, Legendary, custom("early_adopter"), 100),
            seed("beta_tester", "Beta Tester", "Helped test features before release", "🧪", Special, Epic, custom("beta_tester"), 75),
        ];

        Self { badges }
    }
}

#[allow(clippy::too_many_arguments)]
fn seed(
    key: &str,
    name: &str,
    description: &str,
    icon: &str,
    category: BadgeCategory,
    rarity: BadgeRarity,
    criteria: BadgeCriteria,
    points: u32,
) -> Badge {
    Badge {
        key: BadgeKey::new(key),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        category,
        rarity,
        criteria,
        points,
        is_active: true,
    }
}

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
    DuplicateKey(String),
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read badge catalog: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid badge catalog CSV: {}", err),
            CatalogImportError::InvalidRow { line, reason } => {
                write!(f, "badge catalog line {}: {}", line, reason)
            }
            CatalogImportError::DuplicateKey(key) => {
                write!(f, "badge catalog defines '{}' more than once", key)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::InvalidRow { .. } | CatalogImportError::DuplicateKey(_) => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads an admin-maintained badge catalog from CSV.
///
/// Expected header: `key,name,description,icon,category,rarity,criteria_type,target,
/// threshold,custom_logic,points,is_active`.
pub struct BadgeCatalogImporter;

impl BadgeCatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<BadgeCatalog, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<BadgeCatalog, CatalogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut record = csv::StringRecord::new();
        let mut seen = HashSet::new();
        let mut badges = Vec::new();

        while csv_reader.read_record(&mut record)? {
            let row: CatalogRow = record.deserialize(Some(&headers))?;
            let line = record.position().map(|position| position.line()).unwrap_or_default();
            let badge = row.into_badge(line)?;
            if !seen.insert(badge.key.clone()) {
                return Err(CatalogImportError::DuplicateKey(badge.key.0));
            }
            badges.push(badge);
        }

        Ok(BadgeCatalog { badges })
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    key: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
    category: String,
    rarity: String,
    criteria_type: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    threshold: Option<String>,
    #[serde(default)]
    custom_logic: Option<String>,
    points: String,
    #[serde(default)]
    is_active: Option<String>,
}

impl CatalogRow {
    fn into_badge(self, line: u64) -> Result<Badge, CatalogImportError> {
        let invalid = |reason: String| CatalogImportError::InvalidRow { line, reason };

        if self.key.is_empty() {
            return Err(invalid("badge key is empty".to_string()));
        }
        let category = BadgeCategory::parse(&self.category)
            .ok_or_else(|| invalid(format!("unknown category '{}'", self.category)))?;
        let rarity = BadgeRarity::parse(&self.rarity)
            .ok_or_else(|| invalid(format!("unknown rarity '{}'", self.rarity)))?;
        let points = self
            .points
            .parse::<u32>()
            .map_err(|_| invalid(format!("points '{}' is not a non-negative integer", self.points)))?;
        let is_active = match self.is_active.as_deref().map(str::to_ascii_lowercase) {
            None => true,
            Some(flag) => match flag.as_str() {
                "" | "true" | "yes" | "1" => true,
                "false" | "no" | "0" => false,
                other => return Err(invalid(format!("is_active '{other}' is not a boolean"))),
            },
        };

        let threshold = |raw: Option<&str>| -> Result<u64, CatalogImportError> {
            let raw = raw.filter(|value| !value.is_empty()).ok_or_else(|| {
                invalid(format!("{} criteria requires a threshold", self.criteria_type))
            })?;
            raw.parse::<u64>()
                .map_err(|_| invalid(format!("threshold '{raw}' is not a non-negative integer")))
        };

        let criteria = match self.criteria_type.to_ascii_lowercase().as_str() {
            "count" => BadgeCriteria::Count {
                target: CountTarget::parse(self.target.as_deref().unwrap_or_default()),
                threshold: threshold(self.threshold.as_deref())?,
            },
            "rank" => BadgeCriteria::Rank {
                threshold: u32::try_from(threshold(self.threshold.as_deref())?)
                    .map_err(|_| invalid("rank threshold is out of range".to_string()))?,
            },
            "custom" => BadgeCriteria::Custom {
                predicate: CustomPredicate::parse(self.custom_logic.as_deref().unwrap_or_default()),
            },
            other => {
                warn!(key = %self.key, criteria_type = other, "unsupported badge criteria imported");
                BadgeCriteria::Unsupported
            }
        };

        Ok(Badge {
            key: BadgeKey(self.key),
            name: self.name,
            description: self.description,
            icon: self.icon,
            category,
            rarity,
            criteria,
            points,
            is_active,
        })
    }
}
