//! Unit tests for the document module.

use super::fixtures::MemoryDocument;
use super::*;
use crate::error::VariationError;

#[test]
fn test_build_assigns_addresses_in_document_order() {
    let doc = MemoryDocument::nested();
    let tree = LayerTree::build(&doc);

    let addresses: Vec<String> = tree.iter().map(|n| n.address.to_string()).collect();
    assert_eq!(addresses, vec!["0", "1", "1.0", "1.0.clip.0", "1.1", "2"]);

    let labels: Vec<&str> = tree.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["bg", "chars", "char_a", "char_a_shade", "char_b", "fx"]
    );
}

#[test]
fn test_clip_layers_are_siblings_after_their_owner() {
    let doc = MemoryDocument::new(vec![
        LiveLayer::pixel("base", true).with_clip_layers(vec![
            LiveLayer::pixel("tint", true),
            LiveLayer::pixel("glow", false),
        ]),
        LiveLayer::pixel("top", true),
    ]);
    let tree = LayerTree::build(&doc);

    let top_level: Vec<String> = tree.nodes.iter().map(|n| n.address.to_string()).collect();
    assert_eq!(top_level, vec!["0", "0.clip.0", "0.clip.1", "1"]);
    assert!(!tree.nodes[2].visible);
}

#[test]
fn test_build_copies_visibility() {
    let doc = MemoryDocument::nested();
    let tree = LayerTree::build(&doc);
    let char_b = tree.find(&"1.1".parse().unwrap()).unwrap();
    assert_eq!(char_b.label, "char_b");
    assert!(!char_b.visible);
}

#[test]
fn test_addresses_round_trip_on_plain_layers() {
    let doc = MemoryDocument::new(vec![
        LiveLayer::pixel("a", true),
        LiveLayer::group(
            "g",
            false,
            vec![
                LiveLayer::pixel("b", true),
                LiveLayer::group("inner", true, vec![LiveLayer::pixel("c", false)]),
            ],
        ),
    ]);
    let tree = LayerTree::build(&doc);
    assert_eq!(tree.len(), 5);

    for node in tree.iter() {
        let live = resolve(doc.layers(), &node.address).unwrap();
        assert_eq!(live.name, node.label);
        assert_eq!(live.visible, node.visible);
    }
}

#[test]
fn test_resolve_clip_address() {
    let doc = MemoryDocument::nested();
    let layer = resolve(doc.layers(), &"1.0.clip.0".parse().unwrap()).unwrap();
    assert_eq!(layer.name, "char_a_shade");
}

#[test]
fn test_resolve_out_of_range_fails() {
    let doc = MemoryDocument::nested();
    let err = resolve(doc.layers(), &"7".parse().unwrap()).unwrap_err();
    assert!(matches!(err, VariationError::AddressResolution { .. }));

    let err = resolve(doc.layers(), &"1.5".parse().unwrap()).unwrap_err();
    assert!(matches!(err, VariationError::AddressResolution { .. }));
}

#[test]
fn test_resolve_clip_on_unsupported_layer_fails() {
    let doc = MemoryDocument::nested();
    let err = resolve(doc.layers(), &"0.clip.0".parse().unwrap()).unwrap_err();
    assert!(matches!(err, VariationError::AddressResolution { .. }));
}

#[test]
fn test_resolve_child_of_pixel_layer_fails() {
    let doc = MemoryDocument::nested();
    assert!(resolve(doc.layers(), &"0.0".parse().unwrap()).is_err());
}

#[test]
fn test_apply_to_writes_visibility() {
    let mut doc = MemoryDocument::nested();
    let mut tree = LayerTree::build(&doc);
    for node in tree.nodes.iter_mut() {
        node.visible = !node.visible;
    }
    tree.find_mut(&"1.0.clip.0".parse().unwrap()).unwrap().visible = false;

    tree.apply_to(&mut doc).unwrap();

    assert!(!doc.layers[0].visible);
    assert!(!doc.layers[1].visible);
    assert!(doc.layers[2].visible);
    let shade = resolve(doc.layers(), &"1.0.clip.0".parse().unwrap()).unwrap();
    assert!(!shade.visible);
}

#[test]
fn test_apply_to_walks_children_of_hidden_group() {
    let mut doc = MemoryDocument::nested();
    let mut tree = LayerTree::build(&doc);
    let group = tree.find_mut(&"1".parse().unwrap()).unwrap();
    group.visible = false;
    // children: char_a, its clip layer, char_b
    group.children[2].visible = true;

    tree.apply_to(&mut doc).unwrap();

    let char_b = resolve(doc.layers(), &"1.1".parse().unwrap()).unwrap();
    assert!(char_b.visible);
    assert!(!doc.layers[1].visible);
}

#[test]
fn test_apply_to_stale_tree_fails() {
    let mut doc = MemoryDocument::flat(&["only"]);
    let tree = LayerTree::new(vec![LayerNode::new("ghost", true, Address::root(3))]);
    let err = tree.apply_to(&mut doc).unwrap_err();
    assert!(matches!(err, VariationError::AddressResolution { .. }));
}

fn psd_fixture(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];

#[test]
fn test_psd_loads_shown_layers_as_visible() {
    let path = psd_fixture("two-layers-red-green-1x1.psd");
    let doc = PsdDocument::open(&path).unwrap();

    let names: Vec<&str> = doc.layers().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Green", "Red"]);
    assert!(doc.layers().iter().all(|l| l.visible));
    assert_eq!(doc.visibility_mask(), vec![true, true]);
}

#[test]
fn test_psd_flatten_as_loaded_matches_composite() {
    let path = psd_fixture("two-layers-red-green-1x1.psd");
    let doc = PsdDocument::open(&path).unwrap();
    let composite = psd::Psd::from_bytes(&std::fs::read(&path).unwrap())
        .unwrap()
        .rgba();

    let flat = doc.flatten().unwrap();
    assert_eq!(flat.as_raw(), &composite);
    assert_eq!(flat.get_pixel(0, 0).0, RED);
}

#[test]
fn test_psd_hidden_layer_is_left_out() {
    let mut doc = PsdDocument::open(&psd_fixture("two-layers-red-green-1x1.psd")).unwrap();
    resolve_mut(doc.layers_mut(), &"1".parse().unwrap()).unwrap().visible = false;

    assert_eq!(doc.flatten().unwrap().get_pixel(0, 0).0, GREEN);
}

#[test]
fn test_psd_groups_nest_bottom_up() {
    let doc = PsdDocument::open(&psd_fixture("green-1x1-one-group-with-two-subgroups.psd")).unwrap();
    let tree = LayerTree::build(&doc);

    let rows: Vec<(String, &str)> = tree
        .iter()
        .map(|n| (n.address.to_string(), n.label.as_str()))
        .collect();
    let expected = vec![
        ("0", "outside group 2"),
        ("0.0", "Sixth Layer"),
        ("1", "Firth Layer"),
        ("2", "outside group"),
        ("2.0", "Fourth Layer"),
        ("2.1", "third group inside"),
        ("2.2", "second group inside"),
        ("2.2.0", "Third Layer"),
        ("2.2.1", "sub sub group"),
        ("2.2.1.0", "Second Layer"),
        ("2.3", "first group inside"),
        ("2.3.0", "First Layer"),
    ];
    let expected: Vec<(String, &str)> = expected
        .into_iter()
        .map(|(a, l)| (a.to_string(), l))
        .collect();
    assert_eq!(rows, expected);
    assert!(tree.iter().all(|n| n.visible));
}

#[test]
fn test_psd_empty_group_keeps_its_place() {
    let doc = PsdDocument::open(&psd_fixture("green-1x1-one-group-with-two-subgroups.psd")).unwrap();
    let empty = resolve(doc.layers(), &"2.1".parse().unwrap()).unwrap();
    assert_eq!(empty.name, "third group inside");
    assert_eq!(empty.children().map(|c| c.len()), Some(0));

    let only_group = PsdDocument::open(&psd_fixture("rle-compressed-empty-channel.psd")).unwrap();
    assert_eq!(only_group.layers().len(), 1);
    assert!(only_group.layers()[0].is_group());
    assert!(only_group.visibility_mask().is_empty());
}

#[test]
fn test_psd_hidden_group_masks_its_children() {
    let mut doc =
        PsdDocument::open(&psd_fixture("green-1x1-one-group-one-layer-inside-one-outside.psd"))
            .unwrap();
    let names: Vec<&str> = doc.layers().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Second Layer", "group"]);

    resolve_mut(doc.layers_mut(), &"1".parse().unwrap()).unwrap().visible = false;
    let inside = resolve(doc.layers(), &"1.0".parse().unwrap()).unwrap();
    assert!(inside.visible);
    // Engine order is top-down: First Layer, then Second Layer
    assert_eq!(doc.visibility_mask(), vec![false, true]);

    let mut lone =
        PsdDocument::open(&psd_fixture("green-1x1-one-group-one-layer-inside.psd")).unwrap();
    assert_eq!(lone.flatten().unwrap().get_pixel(0, 0).0, GREEN);
    resolve_mut(lone.layers_mut(), &"0".parse().unwrap()).unwrap().visible = false;
    assert_eq!(lone.flatten().unwrap().get_pixel(0, 0).0, [0, 0, 0, 0]);
}
