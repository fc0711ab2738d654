//! Namespace-tolerant lookup of KML elements by logical name.
//!
//! Real-world KML mixes namespaced and non-namespaced markup. Every lookup in
//! the crate goes through [`ElementLocator`], which applies one fixed policy:
//!
//! 1. namespace-qualified match (only when the document declares a namespace);
//! 2. unqualified local-name match in any namespace;
//! 3. ASCII case-insensitive local-name match.
//!
//! Each tier only runs when the previous one found nothing.

use roxmltree::{Document, Node};

use super::utils::get_tag_name;
use crate::error::{IngestError, Result};

/// A parsed KML document with its namespace-presence flag.
pub struct MarkupDocument<'input> {
    doc: Document<'input>,
    has_namespace: bool,
    namespace_uri: String,
}

impl<'input> MarkupDocument<'input> {
    /// Parse KML text.
    ///
    /// Namespace presence is detected once: the root element carries a
    /// namespace, or the raw text declares one with `xmlns`.
    pub fn parse(text: &'input str, namespace_uri: &str) -> Result<Self> {
        let doc = Document::parse(text).map_err(|e| IngestError::malformed("KML", e))?;
        let has_namespace =
            doc.root_element().tag_name().namespace().is_some() || text.contains("xmlns");

        tracing::debug!(has_namespace, namespace_uri, "Parsed KML document");

        Ok(Self {
            doc,
            has_namespace,
            namespace_uri: namespace_uri.to_string(),
        })
    }

    /// Root element of the document.
    pub fn root(&self) -> Node<'_, 'input> {
        self.doc.root_element()
    }

    #[must_use]
    pub fn has_namespace(&self) -> bool {
        self.has_namespace
    }

    /// Locator bound to this document's namespace policy.
    pub fn locator(&self) -> ElementLocator<'_> {
        ElementLocator {
            namespace: self
                .has_namespace
                .then_some(self.namespace_uri.as_str()),
        }
    }

    /// All placemarks in document order. The position in this list is the
    /// placemark index used to pair geometry with metadata.
    pub fn placemarks(&self) -> Vec<Node<'_, 'input>> {
        self.locator().find_all(self.root(), "Placemark")
    }
}

/// Finds elements by logical (unprefixed) name.
#[derive(Debug, Clone, Copy)]
pub struct ElementLocator<'ns> {
    namespace: Option<&'ns str>,
}

impl<'ns> ElementLocator<'ns> {
    /// Locator that qualifies lookups with `namespace` when given.
    #[must_use]
    pub fn new(namespace: Option<&'ns str>) -> Self {
        Self { namespace }
    }

    /// All descendants of `scope` (excluding `scope`) named `name`.
    ///
    /// # Examples
    /// ```
    /// use roxmltree::Document;
    /// use cadastre_ingest::xml::ElementLocator;
    ///
    /// let xml = r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Placemark/><Placemark/></kml>"#;
    /// let doc = Document::parse(xml).unwrap();
    /// let locator = ElementLocator::new(Some("http://www.opengis.net/kml/2.2"));
    /// assert_eq!(locator.find_all(doc.root_element(), "Placemark").len(), 2);
    /// ```
    pub fn find_all<'a, 'input>(&self, scope: Node<'a, 'input>, name: &str) -> Vec<Node<'a, 'input>> {
        if let Some(namespace) = self.namespace {
            let qualified = Self::collect(scope, |n| {
                get_tag_name(n) == name && n.tag_name().namespace() == Some(namespace)
            });
            if !qualified.is_empty() {
                return qualified;
            }
        }

        let local = Self::collect(scope, |n| get_tag_name(n) == name);
        if !local.is_empty() {
            return local;
        }

        Self::collect(scope, |n| get_tag_name(n).eq_ignore_ascii_case(name))
    }

    /// First descendant of `scope` named `name`, under the same policy.
    pub fn find_first<'a, 'input>(&self, scope: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
        self.find_all(scope, name).into_iter().next()
    }

    fn collect<'a, 'input>(
        scope: Node<'a, 'input>,
        predicate: impl Fn(Node<'a, 'input>) -> bool,
    ) -> Vec<Node<'a, 'input>> {
        scope
            .descendants()
            .skip(1)
            .filter(|n| n.is_element() && predicate(*n))
            .collect()
    }
}
