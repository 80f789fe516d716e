//! Depth-indented rendering of a scored crawl tree, for diagnostics.

use crate::crawler::{CrawlNode, CrawlTree};

/// Render `tree` as nested parentheses, one node per line:
///
/// ```text
/// (https://root.test/,84.0 [llm:2, robot:1]
///   (https://a.test/,30.0 [robot:1])
/// )
/// ```
///
/// Scores read `0.0` for nodes that were never aggregated.
pub fn format_tree(tree: &CrawlTree) -> String {
    let mut out = String::new();
    write_node(&tree.root, &mut out);
    out
}

fn write_node(node: &CrawlNode, out: &mut String) {
    let indent = "  ".repeat(node.depth.saturating_sub(1));
    out.push_str(&format!(
        "{}({},{:.1}",
        indent,
        node.page.url(),
        node.aggregate_score().unwrap_or_default()
    ));

    let stats = node
        .page
        .hits()
        .iter()
        .map(|hit| format!("{}:{}", hit.term, hit.count))
        .collect::<Vec<_>>()
        .join(", ");
    if !stats.is_empty() {
        out.push_str(&format!(" [{}]", stats));
    }

    if node.children.is_empty() {
        out.push_str(")\n");
        return;
    }

    out.push('\n');
    for child in &node.children {
        write_node(child, out);
    }
    out.push_str(&indent);
    out.push_str(")\n");
}
