//! XML utility functions for navigating and extracting data from DOM trees.

use roxmltree::Node;

/// Get the tag name without namespace.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use cadastre_ingest::xml::get_tag_name;
///
/// let xml = r#"<kml:Placemark xmlns:kml="http://www.opengis.net/kml/2.2"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "Placemark");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Check if a node is an element with the given local name.
pub fn has_tag(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && get_tag_name(node) == tag
}

/// Get all element children of a node.
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

/// Get the direct text content of a node, trimmed.
///
/// # Returns
/// Trimmed text content, or empty string if no text
pub fn get_text(node: Node<'_, '_>) -> String {
    node.text()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Concatenate every text node below `node`, including CDATA sections.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use cadastre_ingest::xml::collect_text;
///
/// let xml = "<description><![CDATA[<td>Malik</td>]]> tail</description>";
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(collect_text(doc.root_element()), "<td>Malik</td> tail");
/// ```
pub fn collect_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}
