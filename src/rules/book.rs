//! The live variation and modifier collections.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VariationError};

use super::{Modifier, Variation};

/// Variations and modifiers as one unit. This is also the on-disk shape of
/// the configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleBook {
    #[serde(default)]
    pub variations: Vec<Variation>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl RuleBook {
    pub fn is_empty(&self) -> bool {
        self.variations.is_empty() && self.modifiers.is_empty()
    }

    pub fn next_variation_id(&self) -> u32 {
        self.variations.iter().map(|v| v.id).max().unwrap_or(0) + 1
    }

    pub fn next_modifier_id(&self) -> u32 {
        self.modifiers.iter().map(|m| m.id).max().unwrap_or(0) + 1
    }

    pub fn variation(&self, id: u32) -> Option<&Variation> {
        self.variations.iter().find(|v| v.id == id)
    }

    pub fn modifier(&self, id: u32) -> Option<&Modifier> {
        self.modifiers.iter().find(|m| m.id == id)
    }

    /// Replace the variation with the same id, or append it with a fresh id
    /// when it has none. Every linked modifier must exist.
    pub fn upsert_variation(&mut self, mut variation: Variation) -> Result<u32> {
        if let Some(missing) = variation
            .modifiers
            .iter()
            .find(|id| self.modifier(**id).is_none())
        {
            return Err(VariationError::ReferentialIntegrity(format!(
                "variation {} links unknown modifier {}",
                variation.name, missing
            )));
        }

        if let Some(slot) = self.variations.iter_mut().find(|v| v.id == variation.id && v.id != 0) {
            *slot = variation;
            return Ok(slot.id);
        }
        if variation.id == 0 {
            variation.id = self.next_variation_id();
        }
        let id = variation.id;
        self.variations.push(variation);
        Ok(id)
    }

    pub fn upsert_modifier(&mut self, mut modifier: Modifier) -> u32 {
        if let Some(slot) = self.modifiers.iter_mut().find(|m| m.id == modifier.id && m.id != 0) {
            *slot = modifier;
            return slot.id;
        }
        if modifier.id == 0 {
            modifier.id = self.next_modifier_id();
        }
        let id = modifier.id;
        self.modifiers.push(modifier);
        id
    }

    pub fn remove_variation(&mut self, id: u32) -> Option<Variation> {
        let index = self.variations.iter().position(|v| v.id == id)?;
        Some(self.variations.remove(index))
    }

    /// Remove a modifier nobody links to. Rejected otherwise, with both
    /// collections left as they were.
    pub fn remove_modifier(&mut self, id: u32) -> Result<Modifier> {
        self.check_modifier_removable(id)?;
        let index = self
            .modifiers
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| VariationError::ReferentialIntegrity(format!("no modifier with id {}", id)))?;
        Ok(self.modifiers.remove(index))
    }

    /// Fails with the message shown to the user when variations link `id`.
    pub fn check_modifier_removable(&self, id: u32) -> Result<()> {
        let linked = self.linked_variations(id);
        let Some(first) = linked.first() else {
            return Ok(());
        };
        let mut names = first.name.clone();
        if linked.len() > 1 {
            names.push_str(&format!(" and {} more", linked.len() - 1));
        }
        Err(VariationError::ReferentialIntegrity(format!(
            "This modifier cannot be deleted because it is linked to {}",
            names
        )))
    }

    pub fn linked_variations(&self, modifier_id: u32) -> Vec<&Variation> {
        self.variations
            .iter()
            .filter(|v| v.is_linked(modifier_id))
            .collect()
    }

    /// Linked modifiers of `variation`, in link order.
    pub fn variation_modifiers(&self, variation: &Variation) -> Result<Vec<Modifier>> {
        variation
            .modifiers
            .iter()
            .map(|id| {
                self.modifier(*id).cloned().ok_or_else(|| {
                    VariationError::ReferentialIntegrity(format!(
                        "variation {} links unknown modifier {}",
                        variation.name, id
                    ))
                })
            })
            .collect()
    }

    /// Move the variation at `index` one slot up or down. Returns false at the ends.
    pub fn move_variation(&mut self, index: usize, up: bool) -> bool {
        swap_neighbour(&mut self.variations, index, up)
    }

    pub fn move_modifier(&mut self, index: usize, up: bool) -> bool {
        swap_neighbour(&mut self.modifiers, index, up)
    }
}

pub(crate) fn swap_neighbour<T>(items: &mut [T], index: usize, up: bool) -> bool {
    let target = if up { index.checked_sub(1) } else { Some(index + 1) };
    match target {
        Some(t) if t < items.len() && index < items.len() => {
            items.swap(index, t);
            true
        }
        _ => false,
    }
}
