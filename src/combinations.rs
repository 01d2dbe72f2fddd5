//! Combinatorial expansion of linked modifiers.
//!
//! A combination bitmask carries one `0`/`1` per linked modifier, most
//! significant character first, and the first character belongs to the first
//! linked modifier. Helpers here derive the modifier subset, the combination
//! names and suffixes, image counts for progress, and the bitmask remap
//! applied after the linked modifier list is edited.

use crate::constants::{EMPTY_NAME, NEW_COMBINATION_NAME};
use crate::error::{Result, VariationError};
use crate::rules::{Combination, Modifier, RuleSet, Variation};

/// Parse `bitmask` into one flag per linked modifier.
pub fn parse_bitmask(bitmask: &str, expected: usize) -> Result<Vec<bool>> {
    let invalid = || VariationError::InvalidBitmask {
        bitmask: bitmask.to_string(),
        expected,
    };
    if bitmask.chars().count() != expected {
        return Err(invalid());
    }
    bitmask
        .chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            _ => Err(invalid()),
        })
        .collect()
}

/// Format flags back into a bitmask string.
pub fn format_bitmask(flags: &[bool]) -> String {
    flags.iter().map(|f| if *f { '1' } else { '0' }).collect()
}

/// Subsequence of `linked` selected by `bitmask`, in linked order.
pub fn modifiers_to_apply<T: Clone>(linked: &[T], bitmask: &str) -> Result<Vec<T>> {
    let flags = parse_bitmask(bitmask, linked.len())?;
    Ok(linked
        .iter()
        .zip(flags)
        .filter(|(_, on)| *on)
        .map(|(m, _)| m.clone())
        .collect())
}

/// Variation name followed by every selected modifier name, or `<Empty>`
/// when nothing is selected.
#[allow(dead_code)]
pub fn combination_name(variation_name: &str, linked: &[Modifier], bitmask: &str) -> Result<String> {
    let active = modifiers_to_apply(linked, bitmask)?;
    if active.is_empty() {
        return Ok(EMPTY_NAME.to_string());
    }
    let mut name = variation_name.to_string();
    for modifier in &active {
        name.push_str(&modifier.name);
    }
    Ok(name)
}

/// Every `2^N` combination in increasing numeric order, zero padded to N digits.
pub fn default_combinations(variation_name: &str, linked: &[Modifier]) -> Vec<Combination> {
    let n = linked.len();
    if n == 0 {
        return Vec::new();
    }
    (0..1u64 << n)
        .map(|value| {
            let bitmask = format!("{:0width$b}", value, width = n);
            let name = active_name(variation_name, linked, value);
            Combination::new(name, bitmask)
        })
        .collect()
}

fn active_name(variation_name: &str, linked: &[Modifier], value: u64) -> String {
    let n = linked.len();
    let selected: Vec<&str> = linked
        .iter()
        .enumerate()
        .filter(|(i, _)| value & (1 << (n - 1 - i)) != 0)
        .map(|(_, m)| m.name.as_str())
        .collect();
    if selected.is_empty() {
        EMPTY_NAME.to_string()
    } else {
        format!("{}{}", variation_name, selected.concat())
    }
}

/// Combinations a variation exports: the curated list, or every combination
/// when none was curated.
pub fn effective_combinations(variation: &Variation, linked: &[Modifier]) -> Vec<Combination> {
    if variation.combinations.is_empty() {
        default_combinations(&variation.name, linked)
    } else {
        variation.combinations.clone()
    }
}

/// Variation suffix followed by each active modifier suffix.
pub fn suffix_for(variation: &dyn RuleSet, active: &[Modifier]) -> String {
    let mut suffix = variation.suffix().to_string();
    for modifier in active {
        suffix.push_str(&modifier.suffix);
    }
    suffix
}

/// Images one variation produces.
pub fn variation_image_count(variation: &Variation) -> usize {
    match variation.modifiers.len() {
        0 => 1,
        _ if !variation.combinations.is_empty() => variation.combinations.len(),
        n => 1usize.checked_shl(n as u32).unwrap_or(usize::MAX),
    }
}

/// Total images an export run over `variations` will write.
pub fn expected_image_count(variations: &[Variation]) -> usize {
    variations
        .iter()
        .map(variation_image_count)
        .fold(0usize, usize::saturating_add)
}

/// Rewrite bitmasks after the linked list changed from `old_links` to
/// `new_links`: each modifier keeps its old bit, newly linked ones get `0`.
///
/// Only meaningful for a single edit session of one variation. An empty
/// `new_links` leaves the combinations as they are.
pub fn remap_combinations(
    combinations: &[Combination],
    old_links: &[u32],
    new_links: &[u32],
) -> Result<Vec<Combination>> {
    if new_links.is_empty() {
        return Ok(combinations.to_vec());
    }
    combinations
        .iter()
        .map(|combination| {
            let old = parse_bitmask(&combination.bitmask, old_links.len())?;
            let flags: Vec<bool> = new_links
                .iter()
                .map(|id| {
                    old_links
                        .iter()
                        .position(|o| o == id)
                        .is_some_and(|i| old[i])
                })
                .collect();
            Ok(Combination::new(combination.name.clone(), format_bitmask(&flags)))
        })
        .collect()
}

/// Editing operations of the combinations dialog.
pub trait CombinationListExt {
    /// Append a row named "New comb" with every bit cleared.
    fn add_blank(&mut self, linked: usize);
    fn remove_at(&mut self, index: usize) -> Option<Combination>;
    fn move_up(&mut self, index: usize) -> bool;
    fn move_down(&mut self, index: usize) -> bool;
    /// Flip one bit of the row at `index`.
    fn toggle_bit(&mut self, index: usize, bit: usize) -> Result<()>;
}

impl CombinationListExt for Vec<Combination> {
    fn add_blank(&mut self, linked: usize) {
        self.push(Combination::new(NEW_COMBINATION_NAME, "0".repeat(linked)));
    }

    fn remove_at(&mut self, index: usize) -> Option<Combination> {
        (index < self.len()).then(|| self.remove(index))
    }

    fn move_up(&mut self, index: usize) -> bool {
        crate::rules::swap_neighbour(self, index, true)
    }

    fn move_down(&mut self, index: usize) -> bool {
        crate::rules::swap_neighbour(self, index, false)
    }

    fn toggle_bit(&mut self, index: usize, bit: usize) -> Result<()> {
        let Some(combination) = self.get_mut(index) else {
            return Ok(());
        };
        let len = combination.bitmask.chars().count();
        let mut flags = parse_bitmask(&combination.bitmask, len)?;
        if let Some(flag) = flags.get_mut(bit) {
            *flag = !*flag;
        }
        combination.bitmask = format_bitmask(&flags);
        Ok(())
    }
}
