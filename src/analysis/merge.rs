//! Fragment merge engine.
//!
//! Two passes over each page, always in this order:
//!
//! 1. **Vertical continuation**: fragments directly below the running group
//!    with enough horizontal overlap fold into it (newline-joined). The fold
//!    repeats until nothing more joins, since a widened group can reach a
//!    fragment that an earlier fold left alone.
//! 2. **Same-line joining**: fragments on the same visual line that overlap or
//!    sit within a small gap of the group, on either side, fold together
//!    (space-joined, left to right).
//!
//! Both passes sort by `(y0, x0)` and never cross a page boundary.

use std::collections::BTreeMap;

use crate::model::{BBox, Fragment, FragmentContent};

/// Merge tolerances.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    /// How far below the group's bottom edge a continuation may start
    pub vertical_tolerance: f32,
    /// Horizontal overlap ratio a continuation must exceed
    pub min_overlap_ratio: f32,
    /// Vertical slack for the same-line test
    pub line_tolerance: f32,
    /// Horizontal gap a same-line join must stay below
    pub max_horizontal_gap: f32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            vertical_tolerance: 5.0,
            min_overlap_ratio: 0.2,
            line_tolerance: 3.0,
            max_horizontal_gap: 10.0,
        }
    }
}

impl MergeConfig {
    /// Set the vertical continuation tolerance.
    pub fn with_vertical_tolerance(mut self, tolerance: f32) -> Self {
        self.vertical_tolerance = tolerance;
        self
    }

    /// Set the minimum horizontal overlap ratio.
    pub fn with_min_overlap_ratio(mut self, ratio: f32) -> Self {
        self.min_overlap_ratio = ratio;
        self
    }

    /// Set the same-line tolerance.
    pub fn with_line_tolerance(mut self, tolerance: f32) -> Self {
        self.line_tolerance = tolerance;
        self
    }

    /// Set the maximum same-line gap.
    pub fn with_max_horizontal_gap(mut self, gap: f32) -> Self {
        self.max_horizontal_gap = gap;
        self
    }
}

/// Fragments being folded into one.
struct MergeGroup {
    members: Vec<Fragment>,
    bbox: BBox,
}

impl MergeGroup {
    fn start(fragment: Fragment) -> Self {
        Self {
            bbox: fragment.bbox,
            members: vec![fragment],
        }
    }

    fn push(&mut self, fragment: Fragment) {
        self.bbox = self.bbox.union(&fragment.bbox);
        self.members.push(fragment);
    }

    /// Finalize into one fragment. A lone member is returned untouched.
    fn finish(mut self, join: Join) -> Fragment {
        if self.members.len() == 1 {
            if let Some(only) = self.members.pop() {
                return only;
            }
        }

        if join == Join::Inline {
            self.members.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
        }
        let separator = join.separator();
        let text = self
            .members
            .iter()
            .map(|f| f.text_content().unwrap_or_default())
            .collect::<Vec<_>>()
            .join(separator);

        let first = &self.members[0];
        Fragment {
            kind: first.kind,
            content: Some(FragmentContent::Text(text)),
            bbox: self.bbox,
            page: first.page,
            xref: None,
        }
    }
}

/// How a group's members are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Join {
    /// Top to bottom, one line each
    Stacked,
    /// Left to right on one line
    Inline,
}

impl Join {
    fn separator(self) -> &'static str {
        match self {
            Join::Stacked => "\n",
            Join::Inline => " ",
        }
    }
}

/// Two-pass merge over classified fragments.
#[derive(Debug, Clone, Default)]
pub struct FragmentMerger {
    config: MergeConfig,
}

impl FragmentMerger {
    /// Create a merger.
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Run both passes: vertical continuation, then same-line joining.
    pub fn merge(&self, fragments: Vec<Fragment>) -> Vec<Fragment> {
        self.merge_horizontal(self.merge_vertical(fragments))
    }

    /// Pass 1: fold multi-line continuations until no more fragments join.
    pub fn merge_vertical(&self, fragments: Vec<Fragment>) -> Vec<Fragment> {
        let before = fragments.len();
        let joins = |group: &BBox, next: &BBox| {
            group.continues_below(next, self.config.vertical_tolerance)
                && group.horizontal_overlap_ratio(next) > self.config.min_overlap_ratio
        };

        let mut merged = fold_pages(fragments, Join::Stacked, &joins);
        loop {
            let count = merged.len();
            merged = fold_pages(merged, Join::Stacked, &joins);
            if merged.len() == count {
                break;
            }
        }
        log::debug!("Vertical merge: {} -> {} fragments", before, merged.len());
        merged
    }

    /// Pass 2: join same-line neighbours separated by a small gap.
    pub fn merge_horizontal(&self, fragments: Vec<Fragment>) -> Vec<Fragment> {
        let before = fragments.len();
        let merged = fold_pages(fragments, Join::Inline, |group, next| {
            group.same_line(next, self.config.line_tolerance)
                && group.horizontal_gap(next) < self.config.max_horizontal_gap
        });
        log::debug!("Horizontal merge: {} -> {} fragments", before, merged.len());
        merged
    }
}

/// Group by page, sort each page in reading order and fold consecutive
/// fragments while `joins(group_bbox, next_bbox)` holds.
fn fold_pages<F>(fragments: Vec<Fragment>, join: Join, joins: F) -> Vec<Fragment>
where
    F: Fn(&BBox, &BBox) -> bool,
{
    let mut pages: BTreeMap<u32, Vec<Fragment>> = BTreeMap::new();
    for fragment in fragments {
        pages.entry(fragment.page).or_default().push(fragment);
    }

    let mut out = Vec::new();
    for (_, mut page) in pages {
        page.sort_by(|a, b| a.bbox.reading_order(&b.bbox));

        let groups = page
            .into_iter()
            .fold(Vec::<MergeGroup>::new(), |mut groups, fragment| {
                match groups.last_mut() {
                    Some(group) if joins(&group.bbox, &fragment.bbox) => group.push(fragment),
                    _ => groups.push(MergeGroup::start(fragment)),
                }
                groups
            });

        out.extend(groups.into_iter().map(|g| g.finish(join)));
    }
    out
}

/// Merge with the default tolerances.
pub fn merge(fragments: Vec<Fragment>) -> Vec<Fragment> {
    FragmentMerger::default().merge(fragments)
}
