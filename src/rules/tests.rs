//! Unit tests for the rules module.

use super::*;
use crate::document::fixtures::MemoryDocument;
use crate::document::LayerTree;
use crate::error::VariationError;

fn visibility(tree: &LayerTree) -> Vec<(String, bool)> {
    tree.iter().map(|n| (n.label.clone(), n.visible)).collect()
}

fn modifier(id: u32, name: &str, inclusions: &[&str], exclusions: &[&str]) -> Modifier {
    Modifier {
        id,
        name: name.to_string(),
        suffix: format!("_{}", name.to_lowercase()),
        inclusions: inclusions.iter().map(|s| s.to_string()).collect(),
        exclusions: exclusions.iter().map(|s| s.to_string()).collect(),
    }
}

fn variation(id: u32, name: &str, inclusions: &[&str], exclusions: &[&str]) -> Variation {
    Variation {
        id,
        name: name.to_string(),
        inclusions: inclusions.iter().map(|s| s.to_string()).collect(),
        exclusions: exclusions.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[test]
fn test_resolve_flat_document() {
    let doc = MemoryDocument::new(vec![
        crate::document::LiveLayer::pixel("bg", true),
        crate::document::LiveLayer::pixel("char_a", false),
        crate::document::LiveLayer::pixel("char_b", true),
    ]);
    let tree = LayerTree::build(&doc);
    let v = variation(1, "V", &["glob:char_a"], &["glob:char_b"]);

    let resolved = apply_rule_set(&v, &tree).unwrap();
    assert_eq!(
        visibility(&resolved),
        vec![
            ("bg".to_string(), true),
            ("char_a".to_string(), true),
            ("char_b".to_string(), false),
        ]
    );
}

#[test]
fn test_no_match_keeps_input_visibility() {
    let tree = LayerTree::build(&MemoryDocument::nested());
    let v = variation(1, "V", &["glob:nothing*"], &["regex:zzz"]);
    let resolved = apply_rule_set(&v, &tree).unwrap();
    assert_eq!(resolved, tree);
}

#[test]
fn test_exclusion_wins_regardless_of_order() {
    let tree = LayerTree::build(&MemoryDocument::flat(&["hat"]));
    let a = variation(1, "A", &["glob:hat", "glob:h*"], &["regex:h"]);
    let b = variation(2, "B", &["regex:h"], &["glob:hat", "glob:*"]);
    for v in [a, b] {
        let resolved = apply_rule_set(&v, &tree).unwrap();
        assert!(!resolved.nodes[0].visible);
    }
}

#[test]
fn test_input_tree_is_not_mutated() {
    let tree = LayerTree::build(&MemoryDocument::nested());
    let before = tree.clone();
    let v = variation(1, "V", &["glob:*"], &[]);
    let resolved = apply_rule_set(&v, &tree).unwrap();
    assert_eq!(tree, before);
    assert!(resolved.iter().all(|n| n.visible));
}

#[test]
fn test_children_and_clip_nodes_are_resolved() {
    let tree = LayerTree::build(&MemoryDocument::nested());
    let v = variation(1, "V", &["glob:char_b"], &["glob:*_shade"]);
    let resolved = apply_rule_set(&v, &tree).unwrap();

    let find = |addr: &str| resolved.find(&addr.parse().unwrap()).unwrap().visible;
    assert!(find("1.1"));
    assert!(!find("1.0.clip.0"));
    assert!(find("1.0"));
    assert_eq!(resolved.len(), tree.len());
}

#[test]
fn test_later_rule_set_wins_when_stacked() {
    let tree = LayerTree::build(&MemoryDocument::flat(&["hat", "scarf", "coat"]));
    let first = modifier(1, "Hide", &[], &["glob:hat", "glob:scarf"]);
    let second = modifier(2, "Hat", &["glob:hat"], &[]);

    let sets: Vec<&dyn RuleSet> = vec![&first, &second];
    let resolved = apply_rule_sets(sets, &tree).unwrap();
    assert_eq!(
        visibility(&resolved),
        vec![
            ("hat".to_string(), true),
            ("scarf".to_string(), false),
            ("coat".to_string(), true),
        ]
    );
}

#[test]
fn test_empty_stack_returns_copy() {
    let tree = LayerTree::build(&MemoryDocument::nested());
    let resolved = apply_rule_sets(Vec::<&dyn RuleSet>::new(), &tree).unwrap();
    assert_eq!(resolved, tree);
}

#[test]
fn test_invalid_pattern_fails_resolution() {
    let tree = LayerTree::build(&MemoryDocument::flat(&["a"]));
    let v = variation(1, "V", &["regex:("], &[]);
    let err = apply_rule_set(&v, &tree).unwrap_err();
    assert!(matches!(err, VariationError::InvalidPattern { .. }));

    let v = variation(1, "V", &["wild:*"], &[]);
    assert!(apply_rule_set(&v, &tree).is_err());
}

#[test]
fn test_next_ids_start_at_one_and_follow_max() {
    let mut book = RuleBook::default();
    assert_eq!(book.next_variation_id(), 1);
    assert_eq!(book.next_modifier_id(), 1);

    book.modifiers.push(modifier(4, "A", &[], &[]));
    book.modifiers.push(modifier(2, "B", &[], &[]));
    assert_eq!(book.next_modifier_id(), 5);
}

#[test]
fn test_upsert_assigns_and_replaces() {
    let mut book = RuleBook::default();
    let id = book.upsert_modifier(modifier(0, "Hat", &[], &[]));
    assert_eq!(id, 1);
    let id = book.upsert_modifier(modifier(0, "Scarf", &[], &[]));
    assert_eq!(id, 2);

    let mut renamed = book.modifier(1).unwrap().clone();
    renamed.name = "Cap".to_string();
    book.upsert_modifier(renamed);
    assert_eq!(book.modifiers.len(), 2);
    assert_eq!(book.modifier(1).unwrap().name, "Cap");

    let mut v = variation(0, "Winter", &[], &[]);
    v.modifiers = vec![2, 1];
    let vid = book.upsert_variation(v).unwrap();
    assert_eq!(vid, 1);
    let names: Vec<String> = book
        .variation_modifiers(book.variation(vid).unwrap())
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["Scarf", "Cap"]);
}

#[test]
fn test_upsert_variation_rejects_unknown_modifier() {
    let mut book = RuleBook::default();
    let mut v = variation(0, "Winter", &[], &[]);
    v.modifiers = vec![9];
    let err = book.upsert_variation(v).unwrap_err();
    assert!(matches!(err, VariationError::ReferentialIntegrity(_)));
    assert!(book.variations.is_empty());
}

#[test]
fn test_remove_linked_modifier_is_rejected() {
    let mut book = RuleBook::default();
    book.upsert_modifier(modifier(0, "Hat", &[], &[]));
    for name in ["Winter", "Autumn", "Spring"] {
        let mut v = variation(0, name, &[], &[]);
        v.modifiers = vec![1];
        book.upsert_variation(v).unwrap();
    }
    let before = book.clone();

    let err = book.remove_modifier(1).unwrap_err();
    assert_eq!(
        err.to_string(),
        "This modifier cannot be deleted because it is linked to Winter and 2 more"
    );
    assert_eq!(book, before);
}

#[test]
fn test_remove_unlinked_modifier() {
    let mut book = RuleBook::default();
    book.upsert_modifier(modifier(0, "Hat", &[], &[]));
    let mut v = variation(0, "Winter", &[], &[]);
    v.modifiers = vec![1];
    book.upsert_variation(v).unwrap();

    assert!(book.check_modifier_removable(1).is_err());
    assert!(book.remove_variation(1).is_some());
    assert!(book.check_modifier_removable(1).is_ok());
    let removed = book.remove_modifier(1).unwrap();
    assert_eq!(removed.name, "Hat");
    assert!(book.is_empty());
}

#[test]
fn test_move_entries() {
    let mut book = RuleBook::default();
    for name in ["A", "B", "C"] {
        book.upsert_modifier(modifier(0, name, &[], &[]));
    }
    assert!(!book.move_modifier(0, true));
    assert!(book.move_modifier(0, false));
    assert!(!book.move_modifier(2, false));
    let names: Vec<&str> = book.modifiers.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["B", "A", "C"]);
}

#[test]
fn test_book_deserializes_from_store_layout() {
    let json = r#"{
        "variations": [
            {"id": 1, "name": "Winter", "suffix": "_w", "inclusions": ["glob:snow*"],
             "exclusions": [], "subfolder": "winter", "modifiers": [2],
             "combinations": [{"name": "WinterHat", "bitflags": "1"}]}
        ],
        "modifiers": [
            {"id": 2, "name": "Hat", "suffix": "_hat", "inclusions": ["regex:hat"], "exclusions": []}
        ]
    }"#;
    let book: RuleBook = serde_json::from_str(json).unwrap();
    assert_eq!(book.variations[0].combinations[0].bitmask, "1");
    assert_eq!(book.variation_modifiers(&book.variations[0]).unwrap()[0].name, "Hat");
}
