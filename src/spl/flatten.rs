//! Recursive text flattening for SPL narrative blocks
//!
//! SPL narrative text nests paragraphs, lists, tables and inline markup to
//! arbitrary depth. [`ContentKind`] picks one rendering rule per node based
//! on which children it carries, and each rule recurses through [`flatten`].

use super::xml::XmlNode;

/// Inline formatting markers dropped by the generic rule
const SKIPPED_INLINE: [&str; 3] = ["sup", "sub", "br"];

/// Rendering rule for a node, in precedence order
#[derive(Debug)]
pub enum ContentKind<'a> {
    Text(&'a str),
    Content(Vec<&'a XmlNode>),
    Paragraphs(Vec<&'a XmlNode>),
    Lists(Vec<&'a XmlNode>),
    Tables(Vec<&'a XmlNode>),
    Generic(&'a XmlNode),
}

impl<'a> ContentKind<'a> {
    pub fn of(node: &'a XmlNode) -> Self {
        Self::of_inline(node).unwrap_or_else(|| Self::of_block(node))
    }

    /// Block-level dispatch used for section bodies. A body without
    /// paragraphs, lists or tables is flattened like any other node.
    pub fn of_block(node: &'a XmlNode) -> Self {
        if node.has_child("paragraph") {
            ContentKind::Paragraphs(node.children_named("paragraph").collect())
        } else if node.has_child("list") {
            ContentKind::Lists(node.children_named("list").collect())
        } else if node.has_child("table") {
            ContentKind::Tables(node.children_named("table").collect())
        } else {
            Self::of_inline(node).unwrap_or(ContentKind::Generic(node))
        }
    }

    fn of_inline(node: &'a XmlNode) -> Option<Self> {
        if let Some(text) = node.direct_text() {
            return Some(ContentKind::Text(text));
        }
        node.has_child("content")
            .then(|| ContentKind::Content(node.children_named("content").collect()))
    }

    pub fn render(&self) -> String {
        match self {
            ContentKind::Text(text) => text.trim().to_string(),
            ContentKind::Content(nodes) => join_non_empty(nodes.iter().map(|n| flatten(n)), " "),
            ContentKind::Paragraphs(nodes) => join_non_empty(nodes.iter().map(|n| flatten(n)), "\n\n"),
            ContentKind::Lists(nodes) => join_non_empty(nodes.iter().map(|n| flatten_list(n)), "\n\n"),
            ContentKind::Tables(nodes) => join_non_empty(nodes.iter().map(|n| flatten_table(n)), "\n\n"),
            ContentKind::Generic(node) => flatten_generic(node),
        }
    }
}

/// Flatten any node to plain text
pub fn flatten(node: &XmlNode) -> String {
    ContentKind::of(node).render()
}

/// Flatten an optional node; absent yields an empty string
pub fn flatten_opt(node: Option<&XmlNode>) -> String {
    node.map(flatten).unwrap_or_default()
}

/// Flatten a sequence of sibling nodes, space separated
pub fn flatten_all<'a>(nodes: impl IntoIterator<Item = &'a XmlNode>) -> String {
    join_non_empty(nodes.into_iter().map(flatten), " ")
}

/// Render a `list` element, one item per line.
///
/// Items are numbered by their position in the list when
/// `listType="ordered"`, otherwise bulleted. Items that flatten to nothing
/// are skipped but keep their number.
pub fn flatten_list(list: &XmlNode) -> String {
    let ordered = list.attribute("listType") == Some("ordered");

    list.children_named("item")
        .map(flatten)
        .enumerate()
        .filter(|(_, text)| !text.is_empty())
        .map(|(i, text)| {
            if ordered {
                format!("{}. {}", i + 1, text)
            } else {
                format!("• {}", text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a `table` element as pipe-separated rows.
///
/// Header rows come first, followed by a dash line as wide as the widest
/// header row, then body rows.
pub fn flatten_table(table: &XmlNode) -> String {
    let header: Vec<String> = table
        .children_named("thead")
        .flat_map(|thead| thead.children_named("tr"))
        .filter_map(render_row)
        .collect();
    let body: Vec<String> = table
        .children_named("tbody")
        .flat_map(|tbody| tbody.children_named("tr"))
        .filter_map(render_row)
        .collect();

    let mut lines = Vec::with_capacity(header.len() + body.len() + 1);
    if let Some(width) = header.iter().map(|row| row.chars().count()).max() {
        lines.extend(header.iter().cloned());
        lines.push("-".repeat(width));
    }
    lines.extend(body);

    lines.join("\n").trim().to_string()
}

fn render_row(row: &XmlNode) -> Option<String> {
    let cells: Vec<String> = row
        .children
        .iter()
        .filter(|cell| cell.name == "th" || cell.name == "td")
        .map(flatten)
        .collect();
    (!cells.is_empty()).then(|| cells.join(" | "))
}

fn flatten_generic(node: &XmlNode) -> String {
    let parts = node
        .child_groups()
        .into_iter()
        .filter(|(name, _)| !SKIPPED_INLINE.contains(name))
        .map(|(_, members)| flatten_all(members));
    join_non_empty(parts, " ")
}

fn join_non_empty(parts: impl Iterator<Item = String>, separator: &str) -> String {
    parts
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(xml: &str) -> XmlNode {
        XmlNode::parse(xml).unwrap()
    }

    #[rstest]
    #[case::ordered(r#"<list listType="ordered"><item>a</item><item>b</item></list>"#, "1. a\n2. b")]
    #[case::unordered(r#"<list listType="unordered"><item>a</item><item>b</item></list>"#, "• a\n• b")]
    #[case::no_type("<list><item>a</item><item>b</item></list>", "• a\n• b")]
    #[case::empty_item_keeps_numbering(r#"<list listType="ordered"><item>a</item><item> </item><item>c</item></list>"#, "1. a\n3. c")]
    #[case::no_items("<list><caption>Doses</caption></list>", "")]
    fn lists(#[case] xml: &str, #[case] expected: &str) {
        assert_eq!(flatten_list(&parse(xml)), expected);
    }

    #[test]
    fn table_with_header_and_body() {
        let table = parse(
            "<table>\
               <thead><tr><th>Name</th><th>Dose</th></tr></thead>\
               <tbody><tr><td>Aspirin</td><td>100mg</td></tr></tbody>\
             </table>",
        );
        assert_eq!(flatten_table(&table), "Name | Dose\n-----------\nAspirin | 100mg");
    }

    #[test]
    fn table_without_header_has_no_separator() {
        let table = parse("<table><tbody><tr><td>a</td></tr><tr><td>b</td><td>c</td></tr></tbody></table>");
        assert_eq!(flatten_table(&table), "a\nb | c");
    }

    #[test]
    fn table_header_separator_matches_widest_row() {
        let table = parse(
            "<table><thead><tr><th>A</th></tr><tr><td>Longer</td><td>Row</td></tr></thead></table>",
        );
        assert_eq!(flatten_table(&table), "A\nLonger | Row\n------------");
    }

    #[test]
    fn direct_text_wins_over_children() {
        let node = parse("<paragraph>Take <content>two</content> tablets</paragraph>");
        assert_eq!(flatten(&node), "Take  tablets");
    }

    #[test]
    fn content_children_join_with_spaces() {
        let node = parse("<td><content>Warning:</content><content>hot</content></td>");
        assert_eq!(flatten(&node), "Warning: hot");
    }

    #[test]
    fn paragraphs_join_with_blank_lines() {
        let node = parse("<text><paragraph>One</paragraph><paragraph/><paragraph>Two</paragraph></text>");
        assert_eq!(flatten(&node), "One\n\nTwo");
    }

    #[test]
    fn generic_skips_inline_markers() {
        let node = parse("<item><caption>Cap</caption><sup>1</sup><br/><renderMultiMedia>img</renderMultiMedia></item>");
        assert_eq!(flatten(&node), "Cap img");
    }

    #[test]
    fn nested_lists_inside_items() {
        let node = parse(
            r#"<list listType="ordered"><item><list><item>inner</item></list></item></list>"#,
        );
        assert_eq!(flatten_list(&node), "1. • inner");
    }

    #[test]
    fn block_dispatch_prefers_paragraphs() {
        let node = parse("<text><list><item>x</item></list><paragraph>p</paragraph></text>");
        assert!(matches!(ContentKind::of_block(&node), ContentKind::Paragraphs(_)));
        assert_eq!(ContentKind::of_block(&node).render(), "p");
    }

    #[rstest]
    #[case::plain_text("<text>Keep out of reach of children.</text>", "Keep out of reach of children.")]
    #[case::mixed_content("<text>Intro <content>bold</content></text>", "Intro")]
    #[case::content_only("<text><content>bold</content> <content>type</content></text>", "bold type")]
    #[case::markup_only("<text><caption>Cap</caption><sup>1</sup></text>", "Cap")]
    fn block_dispatch_falls_back_to_inline_rules(#[case] xml: &str, #[case] expected: &str) {
        assert_eq!(ContentKind::of_block(&parse(xml)).render(), expected);
    }

    #[test]
    fn absent_and_empty_nodes_flatten_to_nothing() {
        assert_eq!(flatten_opt(None), "");
        assert_eq!(flatten(&XmlNode::new("text")), "");
    }
}
