//! Visibility resolution: rule sets over layer snapshots.

use crate::document::{LayerNode, LayerTree};
use crate::error::Result;

use super::pattern::CompiledPattern;
use super::RuleSet;

/// A rule set with every pattern compiled once.
pub struct CompiledRuleSet {
    inclusions: Vec<CompiledPattern>,
    exclusions: Vec<CompiledPattern>,
}

impl CompiledRuleSet {
    pub fn compile(rule_set: &dyn RuleSet) -> Result<Self> {
        Ok(Self {
            inclusions: compile_all(rule_set.inclusions())?,
            exclusions: compile_all(rule_set.exclusions())?,
        })
    }

    /// Visibility for `label` given its incoming value. Exclusions run after
    /// inclusions, so they win; no match keeps `current`.
    pub fn decide(&self, label: &str, current: bool) -> bool {
        let mut visible = current;
        if self.inclusions.iter().any(|p| p.matches(label)) {
            visible = true;
        }
        if self.exclusions.iter().any(|p| p.matches(label)) {
            visible = false;
        }
        visible
    }

    pub fn apply(&self, tree: &LayerTree) -> LayerTree {
        LayerTree::new(tree.nodes.iter().map(|n| self.apply_node(n)).collect())
    }

    fn apply_node(&self, node: &LayerNode) -> LayerNode {
        let mut out = node.shallow_copy();
        out.visible = self.decide(&node.label, node.visible);
        out.children = node.children.iter().map(|c| self.apply_node(c)).collect();
        out
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<CompiledPattern>> {
    patterns.iter().map(|p| CompiledPattern::parse(p)).collect()
}

/// Resolve one rule set over `tree`. The input is never modified.
pub fn apply_rule_set(rule_set: &dyn RuleSet, tree: &LayerTree) -> Result<LayerTree> {
    Ok(CompiledRuleSet::compile(rule_set)?.apply(tree))
}

/// Successive single-set passes; a later set overrides earlier ones on any
/// node it matches.
pub fn apply_rule_sets<'a, I>(rule_sets: I, tree: &LayerTree) -> Result<LayerTree>
where
    I: IntoIterator<Item = &'a dyn RuleSet>,
{
    rule_sets
        .into_iter()
        .try_fold(tree.clone(), |acc, rule_set| apply_rule_set(rule_set, &acc))
}
