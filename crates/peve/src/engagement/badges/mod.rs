//! Badge catalog, qualification rules and the award engine.

mod catalog;
pub mod domain;
mod engine;
pub(crate) mod rules;

pub use catalog::{BadgeCatalog, BadgeCatalogImporter, CatalogImportError};
pub use domain::{
    AwardedBadge, Badge, BadgeCategory, BadgeCriteria, BadgeKey, BadgeRarity, CountTarget,
    CustomPredicate, UserBadge,
};
pub use engine::BadgeEngine;
