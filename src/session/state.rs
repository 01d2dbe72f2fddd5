//! The session: one document, its snapshots and the rule collections.

use std::path::PathBuf;

use bevy::prelude::*;

use crate::combinations::{format_bitmask, modifiers_to_apply};
use crate::constants::BASE_WINDOW_TITLE;
use crate::document::{Address, LayerDocument, LayerTree};
use crate::error::{Result, VariationError};
use crate::rules::{apply_rule_set, apply_rule_sets, Modifier, RuleBook, RuleSet, Variation};

/// Long-running operation currently holding the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Loading,
    Rendering,
    Exporting,
}

impl Activity {
    pub fn description(&self) -> &'static str {
        match self {
            Activity::Loading => "Loading PSD...",
            Activity::Rendering => "Rendering PSD...",
            Activity::Exporting => "Exporting images...",
        }
    }
}

/// Process-wide state. The live document is moved out while a background
/// task works on it and handed back when the task finishes.
#[derive(Resource, Default)]
pub struct Session {
    document: Option<Box<dyn LayerDocument>>,
    /// True from a successful load until the next load starts
    loaded: bool,
    pub document_path: Option<PathBuf>,
    /// Load-time snapshot every resolution starts from
    pub baseline: LayerTree,
    /// What the layer panel shows and edits
    pub view: LayerTree,
    pub book: RuleBook,
    pub active_variation: Option<u32>,
    /// Applied modifiers of the active variation, by id
    pub active_modifiers: Vec<u32>,
    pub output_dir: Option<PathBuf>,
    pub activity: Option<Activity>,
}

impl Session {
    pub fn has_document(&self) -> bool {
        self.loaded
    }

    pub fn is_busy(&self) -> bool {
        self.activity.is_some()
    }

    /// Drop the current document and mark a load as running.
    pub fn begin_load(&mut self, path: PathBuf) -> Result<()> {
        if self.is_busy() {
            return Err(VariationError::Busy);
        }
        self.document = None;
        self.loaded = false;
        self.baseline = LayerTree::default();
        self.view = LayerTree::default();
        self.clear_selection();
        self.document_path = Some(path);
        self.activity = Some(Activity::Loading);
        Ok(())
    }

    /// Install a freshly loaded document and snapshot its hierarchy.
    pub fn install_document(&mut self, document: Box<dyn LayerDocument>) {
        self.baseline = LayerTree::build(document.as_ref());
        self.view = self.baseline.clone();
        self.document = Some(document);
        self.loaded = true;
        self.activity = None;
        self.clear_selection();
    }

    pub fn fail_load(&mut self) {
        self.document_path = None;
        self.activity = None;
    }

    /// Hand the document to a background task.
    pub fn take_document(&mut self, activity: Activity) -> Result<Box<dyn LayerDocument>> {
        if self.is_busy() {
            return Err(VariationError::Busy);
        }
        let document = self.document.take().ok_or(VariationError::NoDocument)?;
        self.activity = Some(activity);
        Ok(document)
    }

    pub fn return_document(&mut self, document: Box<dyn LayerDocument>) {
        self.document = Some(document);
        self.activity = None;
    }

    fn document_mut(&mut self) -> Result<&mut dyn LayerDocument> {
        if self.is_busy() {
            return Err(VariationError::Busy);
        }
        match self.document.as_deref_mut() {
            Some(document) => Ok(document),
            None => Err(VariationError::NoDocument),
        }
    }

    /// Push the layer panel state onto the live document.
    pub fn push_view(&mut self) -> Result<()> {
        let view = self.view.clone();
        view.apply_to(self.document_mut()?)
    }

    /// Manual toggle from the layer panel; takes effect on the next push.
    pub fn set_visible(&mut self, address: &Address, visible: bool) -> bool {
        match self.view.find_mut(address) {
            Some(node) => {
                node.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Back to the load-time hierarchy, nothing applied.
    pub fn reset_layers(&mut self) {
        self.view = self.baseline.clone();
        self.clear_selection();
    }

    pub fn clear_selection(&mut self) {
        self.active_variation = None;
        self.active_modifiers.clear();
    }

    pub fn active_variation(&self) -> Option<&Variation> {
        self.active_variation.and_then(|id| self.book.variation(id))
    }

    /// Apply or un-apply a variation. Applying resolves it over the baseline,
    /// pushes the result and drops any applied modifiers. Un-applying only
    /// clears the selection.
    pub fn apply_variation(&mut self, id: u32, apply: bool) -> Result<()> {
        if !self.has_document() {
            return Err(VariationError::Selection("Load a PSD file first"));
        }
        if !apply {
            if self.active_variation == Some(id) {
                self.clear_selection();
            }
            return Ok(());
        }
        let variation = self
            .book
            .variation(id)
            .ok_or(VariationError::Selection("Unknown variation"))?;
        let tree = apply_rule_set(variation, &self.baseline)?;
        tree.apply_to(self.document_mut()?)?;
        self.view = tree;
        self.active_variation = Some(id);
        self.active_modifiers.clear();
        debug!("Applied variation {}", id);
        Ok(())
    }

    /// Toggle one modifier of the active variation and re-resolve the stack.
    pub fn apply_modifier(&mut self, id: u32, apply: bool) -> Result<()> {
        if !self.has_document() {
            return Err(VariationError::Selection("Load a PSD file first"));
        }
        let variation = self
            .active_variation()
            .ok_or(VariationError::Selection("Apply a variation first"))?;
        if !variation.is_linked(id) {
            return Err(VariationError::Selection(
                "This modifier is not linked to the active variation",
            ));
        }
        let linked = self.book.variation_modifiers(variation)?;

        let mut selected = self.active_modifiers.clone();
        selected.retain(|m| *m != id);
        if apply {
            selected.push(id);
        }
        let bitmask = active_bitmask(&linked, &selected);
        let active = modifiers_to_apply(&linked, &bitmask)?;

        let base = apply_rule_set(variation, &self.baseline)?;
        let tree = apply_rule_sets(active.iter().map(|m| m as &dyn RuleSet), &base)?;
        tree.apply_to(self.document_mut()?)?;
        self.view = tree;
        self.active_modifiers = active.iter().map(|m| m.id).collect();
        debug!("Applied modifiers {}", bitmask);
        Ok(())
    }

    /// Applied modifiers, in link order.
    pub fn active_modifier_list(&self) -> Vec<&Modifier> {
        let Some(variation) = self.active_variation() else {
            return Vec::new();
        };
        variation
            .modifiers
            .iter()
            .filter(|id| self.active_modifiers.contains(id))
            .filter_map(|id| self.book.modifier(*id))
            .collect()
    }

    /// `<base> - <variation> [<mod>|<mod>]`
    pub fn window_title(&self) -> String {
        let mut title = BASE_WINDOW_TITLE.to_string();
        if let Some(variation) = self.active_variation() {
            title.push_str(" - ");
            title.push_str(&variation.name);
            let mods = self.active_modifier_list();
            if !mods.is_empty() {
                let names: Vec<&str> = mods.iter().map(|m| m.name.as_str()).collect();
                title.push_str(&format!(" [{}]", names.join("|")));
            }
        }
        title
    }
}

/// Bitmask over `linked` with a `1` for every id in `selected`.
pub fn active_bitmask(linked: &[Modifier], selected: &[u32]) -> String {
    let flags: Vec<bool> = linked.iter().map(|m| selected.contains(&m.id)).collect();
    format_bitmask(&flags)
}
