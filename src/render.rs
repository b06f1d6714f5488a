//! HTML rendering for the in-memory surface
//!
//! Serializes a [`MemorySurface`](crate::surface::MemorySurface) subtree to
//! an HTML string. Used for snapshot assertions and previews.

use compact_str::CompactString;

use crate::surface::NodeId;
use crate::surface::memory::{MemoryKind, MemoryNode};

/// Render a node and its subtree to HTML.
pub(crate) fn render_html(nodes: &[MemoryNode], node: NodeId) -> String {
    let mut output = String::new();
    render_node(nodes, node, &mut output);
    output
}

/// Render the children of a node to HTML.
pub(crate) fn render_children(nodes: &[MemoryNode], node: NodeId) -> String {
    let mut output = String::new();
    for &child in &nodes[node.index()].children {
        render_node(nodes, child, &mut output);
    }
    output
}

fn render_node(nodes: &[MemoryNode], node: NodeId, output: &mut String) {
    let data = &nodes[node.index()];
    match &data.kind {
        MemoryKind::Text(content) => output.push_str(&escape_html(content)),
        MemoryKind::Element(tag) => render_element(nodes, tag, data, output),
    }
}

/// Render an element to HTML.
fn render_element(nodes: &[MemoryNode], tag: &str, data: &MemoryNode, output: &mut String) {
    output.push('<');
    output.push_str(tag);

    render_attrs(&data.attrs, output);
    if !data.style.is_empty() {
        output.push_str(" style=\"");
        output.push_str(&escape_attr(&style_text(&data.style)));
        output.push('"');
    }

    // Void elements
    if is_void_element(tag) {
        output.push_str(" />");
        return;
    }

    output.push('>');

    // Raw markup replaces structured children
    if let Some(html) = &data.inner_html {
        output.push_str(html);
    } else {
        for &child in &data.children {
            render_node(nodes, child, output);
        }
    }

    output.push_str("</");
    output.push_str(tag);
    output.push('>');
}

/// Render attributes to HTML.
fn render_attrs(attrs: &[(CompactString, String)], output: &mut String) {
    for (name, value) in attrs {
        output.push(' ');
        output.push_str(name);
        output.push_str("=\"");
        output.push_str(&escape_attr(value));
        output.push('"');
    }
}

/// Join style properties as `name: value; name: value`.
fn style_text(style: &[(CompactString, String)]) -> String {
    style
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape attribute value special characters.
fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Check if element is a void element (self-closing).
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{MemorySurface, Surface};

    #[test]
    fn test_render_nested_tree() {
        let surface = MemorySurface::new();
        let root = surface.root("div");
        let p = surface.create_element("p");
        let text = surface.create_text("a < b");
        surface.set_attribute(&p, "title", "say \"hi\"");
        surface.set_style(&p, "color", "red");
        surface.set_style(&p, "margin", "0");
        surface.insert_before(&p, &text, None);
        surface.insert_before(&root, &p, None);

        assert_eq!(
            surface.render(root),
            "<div><p title=\"say &quot;hi&quot;\" style=\"color: red; margin: 0\">a &lt; b</p></div>"
        );
        assert_eq!(surface.render_children(p), "a &lt; b");
    }

    #[test]
    fn test_render_void_element() {
        let surface = MemorySurface::new();
        let root = surface.root("div");
        let br = surface.create_element("br");
        surface.insert_before(&root, &br, None);
        assert_eq!(surface.render_children(root), "<br />");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_attr("\"q\""), "&quot;q&quot;");
    }
}
