//! Block-sequence grammar.
//!
//! The rules form a static table over the closed [`BlockCategory`] enum:
//!
//! | Category | May start | Allowed predecessors       |
//! |----------|-----------|----------------------------|
//! | Effect   | yes       | Effect, Target, Modifier   |
//! | Target   | no        | Effect                     |
//! | Modifier | no        | Effect, Target, Modifier   |

use crate::block::BlockCategory;
use crate::error::{ConfigError, GrammarViolation, ValidationResult};
use crate::skill::Skill;

/// Adjacency rule for one category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrammarRule {
    pub category: BlockCategory,
    pub can_start: bool,
    pub predecessors: &'static [BlockCategory],
}

impl GrammarRule {
    pub fn allows_after(&self, previous: BlockCategory) -> bool {
        self.predecessors.contains(&previous)
    }
}

const RULES: [GrammarRule; 3] = [
    GrammarRule {
        category: BlockCategory::Effect,
        can_start: true,
        predecessors: &[
            BlockCategory::Effect,
            BlockCategory::Target,
            BlockCategory::Modifier,
        ],
    },
    GrammarRule {
        category: BlockCategory::Target,
        can_start: false,
        predecessors: &[BlockCategory::Effect],
    },
    GrammarRule {
        category: BlockCategory::Modifier,
        can_start: false,
        predecessors: &[
            BlockCategory::Effect,
            BlockCategory::Target,
            BlockCategory::Modifier,
        ],
    },
];

/// Stateless validator over [`RULES`].
#[derive(Clone, Copy, Debug, Default)]
pub struct GrammarValidator;

impl GrammarValidator {
    /// The rule governing `category`.
    pub fn rule(category: BlockCategory) -> &'static GrammarRule {
        match category {
            BlockCategory::Effect => &RULES[0],
            BlockCategory::Target => &RULES[1],
            BlockCategory::Modifier => &RULES[2],
        }
    }

    /// Finds the first illegal adjacency. An empty slice has none.
    pub fn check(categories: &[BlockCategory]) -> Result<(), GrammarViolation> {
        let mut previous: Option<BlockCategory> = None;
        for (index, &current) in categories.iter().enumerate() {
            let rule = Self::rule(current);
            let legal = match previous {
                None => rule.can_start,
                Some(previous) => rule.allows_after(previous),
            };
            if !legal {
                return Err(GrammarViolation {
                    index,
                    previous,
                    current,
                });
            }
            previous = Some(current);
        }
        Ok(())
    }

    /// Validates a category sequence on behalf of `skill_id`. Empty is an error.
    pub fn validate_categories(skill_id: &str, categories: &[BlockCategory]) -> ValidationResult {
        if categories.is_empty() {
            return Err(ConfigError::EmptySequence {
                skill: skill_id.to_owned(),
            });
        }
        Self::check(categories).map_err(|violation| ConfigError::Grammar {
            skill: skill_id.to_owned(),
            violation,
        })
    }

    pub fn validate(skill: &Skill) -> ValidationResult {
        Self::validate_categories(skill.id(), &skill.categories())
    }
}
