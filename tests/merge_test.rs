//! Properties of the formula merge engine.

use sempdf::analysis::{merge, FragmentMerger, MergeConfig};
use sempdf::{BBox, Fragment, FragmentKind};

fn formula(text: &str, bbox: [f32; 4], page: u32) -> Fragment {
    Fragment::formula(text, BBox::from(bbox), page)
}

/// An integral split over two lines, an equation with its number beside it,
/// a lone formula, and a two-line formula on the next page.
fn scattered() -> Vec<Fragment> {
    vec![
        formula("x^2", [100.0, 400.0, 130.0, 412.0], 1),
        formula("+ 3", [105.0, 114.0, 170.0, 126.0], 2),
        formula("(2)", [335.0, 201.0, 350.0, 211.0], 1),
        formula("\\int_0^1", [100.0, 100.0, 160.0, 112.0], 1),
        formula("y = 2", [100.0, 100.0, 160.0, 112.0], 2),
        formula("= 1", [300.0, 200.0, 330.0, 212.0], 1),
        formula("f(x) dx", [105.0, 114.0, 170.0, 126.0], 1),
    ]
}

fn contents(fragments: &[Fragment]) -> Vec<(u32, &str)> {
    fragments
        .iter()
        .map(|f| (f.page, f.text_content().unwrap_or_default()))
        .collect()
}

#[test]
fn test_merge_scattered_fragments() {
    let merged = merge(scattered());

    assert_eq!(
        contents(&merged),
        vec![
            (1, "\\int_0^1\nf(x) dx"),
            (1, "= 1 (2)"),
            (1, "x^2"),
            (2, "y = 2\n+ 3"),
        ]
    );
    assert_eq!(merged[0].bbox, BBox::new(100.0, 100.0, 170.0, 126.0));
    assert_eq!(merged[1].bbox, BBox::new(300.0, 200.0, 350.0, 212.0));
    assert!(merged.iter().all(|f| f.kind == FragmentKind::Formula));
}

#[test]
fn test_merge_ignores_input_order() {
    let forward = merge(scattered());

    let mut reversed = scattered();
    reversed.reverse();
    assert_eq!(merge(reversed), forward);

    let mut rotated = scattered();
    rotated.rotate_left(3);
    assert_eq!(merge(rotated), forward);
}

#[test]
fn test_merge_is_stable_on_its_output() {
    let once = merge(scattered());
    let twice = merge(once.clone());
    assert_eq!(twice, once);
}

#[test]
fn test_merge_never_crosses_pages() {
    let fragments = vec![
        formula("a + b", [100.0, 100.0, 160.0, 112.0], 1),
        formula("= c", [105.0, 114.0, 170.0, 126.0], 2),
    ];
    let merged = merge(fragments.clone());
    assert_eq!(merged, fragments);
}

#[test]
fn test_merged_boxes_cover_inputs() {
    let inputs = scattered();
    let merged = merge(inputs.clone());

    assert!(merged.len() <= inputs.len());
    for input in &inputs {
        assert!(
            merged
                .iter()
                .any(|m| m.page == input.page && m.bbox.contains(&input.bbox)),
            "{:?} is not covered",
            input.text_content()
        );
    }
}

#[test]
fn test_vertical_pass_compares_with_latest_group() {
    // "c" sits under "a", but "b" started a new group in between
    let fragments = vec![
        formula("a", [100.0, 100.0, 110.0, 112.0], 1),
        formula("b", [115.0, 100.0, 125.0, 112.0], 1),
        formula("c", [100.0, 114.0, 110.0, 126.0], 1),
    ];
    let merger = FragmentMerger::default();
    assert_eq!(merger.merge_vertical(fragments).len(), 3);
}

#[test]
fn test_custom_tolerances() {
    let fragments = vec![
        formula("a = b", [100.0, 100.0, 160.0, 112.0], 1),
        formula("+ c", [100.0, 125.0, 160.0, 137.0], 1),
    ];
    assert_eq!(merge(fragments.clone()).len(), 2);

    let loose = FragmentMerger::new(MergeConfig::default().with_vertical_tolerance(15.0));
    let merged = loose.merge(fragments);
    assert_eq!(contents(&merged), vec![(1, "a = b\n+ c")]);
}

#[test]
fn test_merge_empty() {
    assert!(merge(Vec::new()).is_empty());
}
