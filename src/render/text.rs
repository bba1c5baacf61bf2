//! Plain text rendering for fragment lists.

use crate::model::{Fragment, FragmentContent};

/// One line per fragment: `[page N] type (x0, y0, x1, y1): content`.
///
/// Line breaks inside content are written as `\n`; table rows are separated
/// by ` / ` and cells by ` | `; images show their object number.
pub fn to_text(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(render_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_line(fragment: &Fragment) -> String {
    let content = match (&fragment.content, fragment.xref) {
        (Some(FragmentContent::Text(text)), _) => text.replace('\n', "\\n"),
        (Some(FragmentContent::Table(grid)), _) => grid
            .rows()
            .iter()
            .map(|row| row.join(" | "))
            .collect::<Vec<_>>()
            .join(" / "),
        (None, Some(xref)) => format!("xref {}", xref),
        (None, None) => String::new(),
    };

    format!(
        "[page {}] {} {}: {}",
        fragment.page, fragment.kind, fragment.bbox, content
    )
}
