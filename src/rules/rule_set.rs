//! Variations, modifiers and their persisted shape.

use serde::{Deserialize, Serialize};

use crate::constants::EMPTY_NAME;

/// Shape shared by variations and modifiers: a named, ordered list of
/// inclusion and exclusion patterns plus an export suffix.
pub trait RuleSet {
    fn id(&self) -> u32;
    fn name(&self) -> &str;
    fn suffix(&self) -> &str;
    /// Stored `kind:body` patterns that make matching layers visible
    fn inclusions(&self) -> &[String];
    /// Stored `kind:body` patterns that hide matching layers
    fn exclusions(&self) -> &[String];
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifier {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub inclusions: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl Modifier {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Stand-in used when a variation has no linked modifiers: no rules, no suffix.
    pub fn empty_sentinel() -> Self {
        Self::new(0, EMPTY_NAME)
    }
}

/// A named selection of linked modifiers, one `0`/`1` per linked modifier,
/// first character for the first linked modifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Combination {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "bitflags")]
    pub bitmask: String,
}

impl Combination {
    pub fn new(name: impl Into<String>, bitmask: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bitmask: bitmask.into(),
        }
    }

    pub fn empty_sentinel() -> Self {
        Self::new(EMPTY_NAME, "0")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Variation {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub inclusions: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    /// Export path below the base output directory
    #[serde(default)]
    pub subfolder: String,
    /// Linked modifier ids, in application order
    #[serde(default)]
    pub modifiers: Vec<u32>,
    /// Hand-curated combinations; empty means every combination
    #[serde(default)]
    pub combinations: Vec<Combination>,
}

impl Variation {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_linked(&self, modifier_id: u32) -> bool {
        self.modifiers.contains(&modifier_id)
    }
}

macro_rules! impl_rule_set {
    ($ty:ty) => {
        impl RuleSet for $ty {
            fn id(&self) -> u32 {
                self.id
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn suffix(&self) -> &str {
                &self.suffix
            }
            fn inclusions(&self) -> &[String] {
                &self.inclusions
            }
            fn exclusions(&self) -> &[String] {
                &self.exclusions
            }
        }
    };
}

impl_rule_set!(Modifier);
impl_rule_set!(Variation);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variation_serialization_keys() {
        let mut variation = Variation::new(3, "Winter");
        variation.subfolder = "winter".to_string();
        variation.modifiers = vec![1, 2];
        variation.combinations = vec![Combination::new("WinterHat", "10")];

        let json = serde_json::to_value(&variation).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["subfolder"], "winter");
        assert_eq!(json["modifiers"], serde_json::json!([1, 2]));
        assert_eq!(json["combinations"][0]["bitmask"], "10");
    }

    #[test]
    fn test_combination_reads_legacy_bitflags_key() {
        let combination: Combination =
            serde_json::from_str(r#"{"name": "AB", "bitflags": "11"}"#).unwrap();
        assert_eq!(combination.bitmask, "11");
    }

    #[test]
    fn test_missing_fields_default() {
        let variation: Variation = serde_json::from_str(r#"{"name": "Only name"}"#).unwrap();
        assert_eq!(variation.id, 0);
        assert!(variation.modifiers.is_empty());
        assert!(variation.combinations.is_empty());
        assert!(variation.subfolder.is_empty());
    }

    #[test]
    fn test_sentinels() {
        let modifier = Modifier::empty_sentinel();
        assert_eq!(modifier.name, EMPTY_NAME);
        assert!(modifier.suffix.is_empty());
        assert!(modifier.inclusions.is_empty());
        assert_eq!(Combination::empty_sentinel().bitmask, "0");
    }
}
