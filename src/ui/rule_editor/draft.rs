//! Working copies edited by the rule set windows.
//!
//! Nothing here touches the [`RuleBook`] until the draft is saved, so
//! closing a window without saving leaves the book as it was.

use crate::combinations::{default_combinations, remap_combinations, CombinationListExt};
use crate::error::{Result, VariationError};
use crate::rules::{Combination, Modifier, PatternKind, RuleBook, RulePattern, Variation};

/// Text input for a new pattern
#[derive(Debug, Clone)]
pub struct PatternInput {
    pub kind: PatternKind,
    pub body: String,
}

impl Default for PatternInput {
    fn default() -> Self {
        Self {
            kind: PatternKind::Glob,
            body: String::new(),
        }
    }
}

impl PatternInput {
    /// Validate and append to `list`, clearing the input on success.
    pub fn commit(&mut self, list: &mut Vec<String>) -> Result<()> {
        let pattern = RulePattern::new(self.kind, self.body.clone());
        pattern.validate()?;
        list.push(pattern.to_string());
        self.body.clear();
        Ok(())
    }
}

/// Inclusion and exclusion inputs shared by both editors
#[derive(Debug, Clone, Default)]
pub struct PatternInputs {
    pub inclusion: PatternInput,
    pub exclusion: PatternInput,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModifierDraft {
    pub modifier: Modifier,
    pub is_new: bool,
    pub inputs: PatternInputs,
}

impl ModifierDraft {
    pub fn new(book: &RuleBook) -> Self {
        Self {
            modifier: Modifier::new(book.next_modifier_id(), ""),
            is_new: true,
            inputs: PatternInputs::default(),
        }
    }

    pub fn edit(modifier: &Modifier) -> Self {
        Self {
            modifier: modifier.clone(),
            is_new: false,
            inputs: PatternInputs::default(),
        }
    }

    pub fn finish(&self) -> Result<Modifier> {
        if self.modifier.name.trim().is_empty() {
            return Err(VariationError::Selection(MISSING_NAME));
        }
        Ok(self.modifier.clone())
    }
}

pub const MISSING_NAME: &str = "Please, enter a name";

pub const STALE_COMBINATIONS: &str = "The combinations setup is not in sync with the modifiers.\n\
     Please, click on \"Configure combinations...\" and confirm that the setup is correct.";

#[derive(Debug, Clone)]
pub struct VariationDraft {
    /// `modifiers` holds the links the combinations were last written for
    pub variation: Variation,
    /// Links as currently shown in the editor
    pub linked: Vec<u32>,
    pub combinations_stale: bool,
    pub is_new: bool,
    pub inputs: PatternInputs,
    pub selected_linked: Option<usize>,
    pub selected_available: Option<usize>,
    pub combinations: Option<CombinationsDraft>,
}

impl VariationDraft {
    pub fn new(book: &RuleBook) -> Self {
        Self::from_variation(Variation::new(book.next_variation_id(), ""), true)
    }

    pub fn edit(variation: &Variation) -> Self {
        Self::from_variation(variation.clone(), false)
    }

    fn from_variation(variation: Variation, is_new: bool) -> Self {
        Self {
            linked: variation.modifiers.clone(),
            variation,
            combinations_stale: false,
            is_new,
            inputs: PatternInputs::default(),
            selected_linked: None,
            selected_available: None,
            combinations: None,
        }
    }

    /// Modifiers of `book` not linked yet, in book order.
    pub fn available<'a>(&self, book: &'a RuleBook) -> Vec<&'a Modifier> {
        book.modifiers
            .iter()
            .filter(|m| !self.linked.contains(&m.id))
            .collect()
    }

    pub fn link(&mut self, id: u32) {
        if !self.linked.contains(&id) {
            self.linked.push(id);
            self.combinations_stale = true;
        }
    }

    pub fn unlink(&mut self, id: u32) {
        let before = self.linked.len();
        self.linked.retain(|m| *m != id);
        if self.linked.len() != before {
            self.links_changed();
        }
    }

    pub fn link_all(&mut self, book: &RuleBook) {
        let ids: Vec<u32> = self.available(book).iter().map(|m| m.id).collect();
        for id in ids {
            self.link(id);
        }
    }

    pub fn unlink_all(&mut self) {
        if !self.linked.is_empty() {
            self.linked.clear();
            self.links_changed();
        }
    }

    /// Curated rows have no columns left once every modifier is unlinked.
    fn links_changed(&mut self) {
        if self.linked.is_empty() {
            self.variation.combinations.clear();
            self.combinations_stale = false;
        } else {
            self.combinations_stale = true;
        }
    }

    pub fn move_linked(&mut self, index: usize, up: bool) -> bool {
        let moved = crate::rules::swap_neighbour(&mut self.linked, index, up);
        if moved {
            self.combinations_stale = true;
            self.selected_linked = Some(if up { index - 1 } else { index + 1 });
        }
        moved
    }

    /// Bring the combinations in line with the current links and open them
    /// for editing. Without curated rows the editor starts from every
    /// combination.
    pub fn open_combinations(&mut self, book: &RuleBook) -> Result<()> {
        if self.combinations_stale && !self.linked.is_empty() {
            self.variation.combinations =
                remap_combinations(&self.variation.combinations, &self.variation.modifiers, &self.linked)?;
            self.combinations_stale = false;
        }
        self.variation.modifiers = self.linked.clone();

        let mods = book.variation_modifiers(&self.variation)?;
        let rows = if self.variation.combinations.is_empty() {
            default_combinations(&self.variation.name, &mods)
        } else {
            self.variation.combinations.clone()
        };
        self.combinations = Some(CombinationsDraft {
            headers: mods.into_iter().map(|m| m.name).collect(),
            rows,
            selected: None,
        });
        Ok(())
    }

    /// Keep the edited rows.
    pub fn accept_combinations(&mut self) {
        if let Some(draft) = self.combinations.take() {
            self.variation.combinations = draft.rows;
        }
    }

    pub fn discard_combinations(&mut self) {
        self.combinations = None;
    }

    /// The variation to store, or an error when curated combinations no
    /// longer match the links.
    pub fn finish(&self) -> Result<Variation> {
        if self.variation.name.trim().is_empty() {
            return Err(VariationError::Selection(MISSING_NAME));
        }
        if self.combinations_stale && !self.variation.combinations.is_empty() {
            return Err(VariationError::Selection(STALE_COMBINATIONS));
        }
        let mut variation = self.variation.clone();
        variation.modifiers = self.linked.clone();
        Ok(variation)
    }
}

/// Rows of the combinations editor, one column per linked modifier
#[derive(Debug, Clone)]
pub struct CombinationsDraft {
    pub headers: Vec<String>,
    pub rows: Vec<Combination>,
    pub selected: Option<usize>,
}

impl CombinationsDraft {
    pub fn add(&mut self) {
        self.rows.add_blank(self.headers.len());
        self.selected = Some(self.rows.len() - 1);
    }

    pub fn remove_selected(&mut self) {
        if let Some(index) = self.selected {
            self.rows.remove_at(index);
            self.selected = None;
        }
    }

    pub fn move_selected(&mut self, up: bool) {
        let Some(index) = self.selected else {
            return;
        };
        let moved = if up {
            self.rows.move_up(index)
        } else {
            self.rows.move_down(index)
        };
        if moved {
            self.selected = Some(if up { index - 1 } else { index + 1 });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> RuleBook {
        let mut book = RuleBook::default();
        for name in ["Hat", "Scarf", "Gloves"] {
            book.upsert_modifier(Modifier::new(0, name));
        }
        book
    }

    #[test]
    fn test_pattern_input_validates() {
        let mut list = Vec::new();
        let mut input = PatternInput::default();
        assert!(input.commit(&mut list).is_err());

        input.kind = PatternKind::Regex;
        input.body = "hat_(".to_string();
        assert!(input.commit(&mut list).is_err());
        assert_eq!(input.body, "hat_(");

        input.body = "hat_.*".to_string();
        input.commit(&mut list).unwrap();
        assert_eq!(list, vec!["regex:hat_.*"]);
        assert!(input.body.is_empty());
    }

    #[test]
    fn test_new_drafts_take_next_ids() {
        let book = book();
        assert_eq!(ModifierDraft::new(&book).modifier.id, 4);
        assert_eq!(VariationDraft::new(&book).variation.id, 1);
    }

    #[test]
    fn test_link_and_unlink_mark_stale() {
        let book = book();
        let mut draft = VariationDraft::new(&book);
        assert_eq!(draft.available(&book).len(), 3);

        draft.link(2);
        assert!(draft.combinations_stale);
        assert_eq!(draft.available(&book).len(), 2);

        draft.link_all(&book);
        assert_eq!(draft.linked, vec![2, 1, 3]);
        draft.unlink(1);
        assert_eq!(draft.linked, vec![2, 3]);
        draft.unlink_all();
        assert!(draft.linked.is_empty());
    }

    #[test]
    fn test_open_combinations_remaps_after_reorder() {
        let book = book();
        let mut variation = Variation::new(1, "V");
        variation.modifiers = vec![1, 2];
        variation.combinations = vec![Combination::new("HatOnly", "10")];
        let mut draft = VariationDraft::edit(&variation);

        assert!(draft.move_linked(1, true));
        draft.link(3);
        assert!(draft.finish().is_err());

        draft.open_combinations(&book).unwrap();
        let rows = &draft.combinations.as_ref().unwrap().rows;
        assert_eq!(rows[0].bitmask, "010");
        assert_eq!(
            draft.combinations.as_ref().unwrap().headers,
            vec!["Scarf", "Hat", "Gloves"]
        );

        draft.accept_combinations();
        let saved = draft.finish().unwrap();
        assert_eq!(saved.modifiers, vec![2, 1, 3]);
        assert_eq!(saved.combinations[0].bitmask, "010");
    }

    #[test]
    fn test_unlinking_everything_drops_curated_rows() {
        let mut variation = Variation::new(1, "V");
        variation.modifiers = vec![1, 2];
        variation.combinations = vec![Combination::new("HatOnly", "10")];

        let mut draft = VariationDraft::edit(&variation);
        draft.unlink_all();
        assert!(!draft.combinations_stale);
        let saved = draft.finish().unwrap();
        assert!(saved.modifiers.is_empty());
        assert!(saved.combinations.is_empty());

        let mut draft = VariationDraft::edit(&variation);
        draft.unlink(1);
        assert!(draft.finish().is_err());
        draft.unlink(2);
        assert!(draft.finish().unwrap().combinations.is_empty());
    }

    #[test]
    fn test_open_combinations_seeds_defaults() {
        let book = book();
        let mut draft = VariationDraft::new(&book);
        draft.variation.name = "W".to_string();
        draft.link(1);
        draft.link(2);
        draft.open_combinations(&book).unwrap();

        let names: Vec<String> = draft
            .combinations
            .as_ref()
            .unwrap()
            .rows
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, vec!["<Empty>", "WScarf", "WHat", "WHatScarf"]);

        // discarding keeps the variation without curated rows
        draft.discard_combinations();
        assert!(draft.finish().unwrap().combinations.is_empty());
    }

    #[test]
    fn test_combinations_draft_editing() {
        let mut draft = CombinationsDraft {
            headers: vec!["A".to_string(), "B".to_string()],
            rows: vec![Combination::new("First", "01")],
            selected: None,
        };
        draft.add();
        assert_eq!(draft.rows[1].bitmask, "00");
        assert_eq!(draft.selected, Some(1));

        draft.move_selected(true);
        assert_eq!(draft.rows[0].name, "New comb");
        assert_eq!(draft.selected, Some(0));

        draft.remove_selected();
        assert_eq!(draft.rows.len(), 1);
        assert_eq!(draft.rows[0].name, "First");
    }

    #[test]
    fn test_finish_requires_a_name() {
        let book = book();
        let mut modifier = ModifierDraft::new(&book);
        assert!(modifier.finish().is_err());
        modifier.modifier.name = "Hood".to_string();
        assert_eq!(modifier.finish().unwrap().id, 4);

        let mut variation = VariationDraft::new(&book);
        variation.variation.name = "  ".to_string();
        assert!(variation.finish().is_err());
    }

    #[test]
    fn test_editing_copy_leaves_original() {
        let mut variation = Variation::new(1, "V");
        variation.inclusions = vec!["glob:a".to_string()];
        let mut draft = VariationDraft::edit(&variation);
        draft.variation.inclusions.clear();
        draft.variation.name = "Changed".to_string();
        assert_eq!(variation.name, "V");
        assert_eq!(variation.inclusions.len(), 1);
    }
}
