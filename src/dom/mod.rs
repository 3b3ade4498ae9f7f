//! HTML document parsing and XPath evaluation
//!
//! One thin seam over the HTML/XPath engine, shared by the fetch worker
//! (link extraction) and the extraction engine (field maps). Parsing is
//! permissive: real-world tag soup produces a tree rather than an error.
//!
//! Text extraction follows the single rule both callers rely on: an
//! element yields its concatenated text content, an attribute yields its
//! value, a text node yields itself.

use skyscraper::html;
use skyscraper::xpath::{self, XpathItemTree};
use thiserror::Error;

pub use skyscraper::xpath::grammar::data_model::XpathItem;

/// Errors from parsing documents or evaluating XPath expressions
#[derive(Debug, Error)]
pub enum DomError {
    #[error("HTML parse error: {0}")]
    Parse(String),

    #[error("Invalid XPath expression '{expr}': {message}")]
    Syntax { expr: String, message: String },

    #[error("XPath evaluation failed for '{expr}': {message}")]
    Eval { expr: String, message: String },
}

/// A parsed HTML document ready for XPath evaluation
pub struct Document {
    tree: XpathItemTree,
}

impl Document {
    /// Parses `text` into a document tree
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let tree = html::parse(text).map_err(|e| DomError::Parse(e.to_string()))?;
        Ok(Self { tree })
    }
}

/// A compiled XPath expression
///
/// Compiling is separated from evaluation so configuration errors surface
/// at load time, while evaluation against many documents reuses the
/// compiled form.
///
/// Expressions with an absolute prefix (`//x`, `/x`) are additionally
/// compiled re-rooted at the context item (`.//x`, `./x`) for scoped
/// evaluation: a field map nested under a context query selects within
/// that context's subtree, not the whole document.
pub struct Xpath {
    compiled: xpath::Xpath,
    scoped: Option<xpath::Xpath>,
    source: String,
}

impl Xpath {
    /// Compiles `source` into an evaluatable expression
    pub fn compile(source: &str) -> Result<Self, DomError> {
        let syntax = |e: String| DomError::Syntax {
            expr: source.to_string(),
            message: e,
        };
        let compiled = xpath::parse(source).map_err(|e| syntax(e.to_string()))?;
        let scoped = if source.starts_with('/') {
            Some(xpath::parse(&format!(".{}", source)).map_err(|e| syntax(e.to_string()))?)
        } else {
            None
        };
        Ok(Self {
            compiled,
            scoped,
            source: source.to_string(),
        })
    }

    /// The expression text this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates against the document root, returning matches in document
    /// order
    pub fn select<'t>(&self, doc: &'t Document) -> Result<Vec<XpathItem<'t>>, DomError> {
        let items = self.compiled.apply(&doc.tree).map_err(|e| DomError::Eval {
            expr: self.source.clone(),
            message: e.to_string(),
        })?;
        Ok(items.into_iter().collect())
    }

    /// Evaluates with `scope` as the context item
    ///
    /// Non-element scopes (attributes, atomics) have no document subtree
    /// to search and yield no matches.
    pub fn select_from<'t>(
        &self,
        doc: &'t Document,
        scope: &XpathItem<'t>,
    ) -> Result<Vec<XpathItem<'t>>, DomError> {
        let item = match scope {
            XpathItem::Node(node) if node.as_element_node().is_ok() => scope.clone(),
            _ => return Ok(Vec::new()),
        };
        let items = self
            .scoped
            .as_ref()
            .unwrap_or(&self.compiled)
            .apply_to_item(&doc.tree, item)
            .map_err(|e| DomError::Eval {
                expr: self.source.clone(),
                message: e.to_string(),
            })?;
        Ok(items.into_iter().collect())
    }
}

/// Returns the text content of a matched item
pub fn item_text(doc: &Document, item: &XpathItem) -> String {
    match item {
        XpathItem::Node(node) => {
            if let Ok(attribute) = node.as_attribute_node() {
                attribute.value.clone()
            } else {
                node.text_content(&doc.tree)
            }
        }
        _ => String::new(),
    }
}
