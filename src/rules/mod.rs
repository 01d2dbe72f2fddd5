//! Visibility rules.
//!
//! A rule set is a named list of `kind:body` patterns that switch layers on
//! (inclusions) or off (exclusions). Variations and modifiers share that
//! shape; variations additionally link modifiers and curate combinations of
//! them. Resolution is pure: it maps a [`LayerTree`](crate::document::LayerTree)
//! to a new tree and never touches the live document.
//!
//! ## Module Structure
//!
//! - [`pattern`] - glob / regex pattern parsing, validation and matching
//! - [`rule_set`] - `RuleSet`, `Variation`, `Modifier`, `Combination`
//! - [`book`] - `RuleBook`, the two live collections
//! - [`resolver`] - applying rule sets to layer snapshots

mod book;
pub mod pattern;
mod resolver;
mod rule_set;

pub use book::RuleBook;
pub(crate) use book::swap_neighbour;
pub use pattern::{CompiledPattern, PatternKind, RulePattern};
pub use resolver::{apply_rule_set, apply_rule_sets, CompiledRuleSet};
pub use rule_set::{Combination, Modifier, RuleSet, Variation};

#[cfg(test)]
mod tests;
