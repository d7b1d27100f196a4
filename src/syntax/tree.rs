//! Persistent, lossless syntax tree.
//!
//! Nodes are immutable and shared through `Arc`. Editing a node means building
//! a new node from the old one's children, so an edit rebuilds only the spine
//! from the changed node up to the root and every untouched subtree is shared
//! with the previous version. Each node caches its full width (trivia
//! included), which keeps byte offsets into the pre-edit text cheap to compute.

use super::trivia::{self, Trivia};
use std::sync::Arc;

/// Node and token kinds use the grammar's kind names (`"invocation_expression"`,
/// `"identifier"`, `"("`, ...).
pub type Kind = &'static str;

/// Kind of the synthetic token that carries trivia at the end of a file
pub const END_OF_FILE: Kind = "end_of_file";

/// A leaf: its text plus the trivia around it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyntaxToken {
    kind: Kind,
    text: String,
    leading: Vec<Trivia>,
    trailing: Vec<Trivia>,
}

impl SyntaxToken {
    pub fn new(kind: Kind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            leading: Vec::new(),
            trailing: Vec::new(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn leading(&self) -> &[Trivia] {
        &self.leading
    }

    pub fn trailing(&self) -> &[Trivia] {
        &self.trailing
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_leading(mut self, leading: Vec<Trivia>) -> Self {
        self.leading = leading;
        self
    }

    pub fn with_trailing(mut self, trailing: Vec<Trivia>) -> Self {
        self.trailing = trailing;
        self
    }

    pub fn full_len(&self) -> usize {
        trivia::width(&self.leading) + self.text.len() + trivia::width(&self.trailing)
    }

    pub fn write_to(&self, out: &mut String) {
        for piece in &self.leading {
            out.push_str(piece.text());
        }
        out.push_str(&self.text);
        for piece in &self.trailing {
            out.push_str(piece.text());
        }
    }

    pub fn into_element(self) -> SyntaxElement {
        SyntaxElement::Token(Arc::new(self))
    }
}

/// A child slot: either a node or a token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyntaxElement {
    Node(Arc<SyntaxNode>),
    Token(Arc<SyntaxToken>),
}

impl SyntaxElement {
    pub fn kind(&self) -> Kind {
        match self {
            SyntaxElement::Node(node) => node.kind(),
            SyntaxElement::Token(token) => token.kind(),
        }
    }

    pub fn full_len(&self) -> usize {
        match self {
            SyntaxElement::Node(node) => node.full_len(),
            SyntaxElement::Token(token) => token.full_len(),
        }
    }

    pub fn as_node(&self) -> Option<&Arc<SyntaxNode>> {
        match self {
            SyntaxElement::Node(node) => Some(node),
            SyntaxElement::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&Arc<SyntaxToken>> {
        match self {
            SyntaxElement::Node(_) => None,
            SyntaxElement::Token(token) => Some(token),
        }
    }

    pub fn first_token(&self) -> Option<&Arc<SyntaxToken>> {
        match self {
            SyntaxElement::Node(node) => node.first_token(),
            SyntaxElement::Token(token) => Some(token),
        }
    }

    pub fn last_token(&self) -> Option<&Arc<SyntaxToken>> {
        match self {
            SyntaxElement::Node(node) => node.last_token(),
            SyntaxElement::Token(token) => Some(token),
        }
    }

    pub fn leading(&self) -> &[Trivia] {
        self.first_token().map(|t| t.leading()).unwrap_or(&[])
    }

    pub fn trailing(&self) -> &[Trivia] {
        self.last_token().map(|t| t.trailing()).unwrap_or(&[])
    }

    /// Source text without the outermost leading and trailing trivia.
    pub fn trimmed_text(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        let start = trivia::width(self.leading());
        let end = out.len() - trivia::width(self.trailing());
        out[start..end.max(start)].to_string()
    }

    /// Concatenated token texts, all trivia dropped.
    pub fn token_text(&self) -> String {
        match self {
            SyntaxElement::Token(token) => token.text().to_string(),
            SyntaxElement::Node(node) => node.token_text(),
        }
    }

    pub fn write_to(&self, out: &mut String) {
        match self {
            SyntaxElement::Node(node) => node.write_to(out),
            SyntaxElement::Token(token) => token.write_to(out),
        }
    }

    /// True if any trivia inside the element (including its outer edges) is a comment.
    pub fn has_comments(&self) -> bool {
        match self {
            SyntaxElement::Token(token) => {
                trivia::has_comments(token.leading()) || trivia::has_comments(token.trailing())
            }
            SyntaxElement::Node(node) => node.children().iter().any(|c| c.element.has_comments()),
        }
    }

    pub fn with_leading(&self, leading: Vec<Trivia>) -> SyntaxElement {
        match self {
            SyntaxElement::Token(token) => {
                SyntaxToken::clone(token).with_leading(leading).into_element()
            }
            SyntaxElement::Node(node) => SyntaxElement::Node(node.with_leading(leading)),
        }
    }

    pub fn with_trailing(&self, trailing: Vec<Trivia>) -> SyntaxElement {
        match self {
            SyntaxElement::Token(token) => {
                SyntaxToken::clone(token).with_trailing(trailing).into_element()
            }
            SyntaxElement::Node(node) => SyntaxElement::Node(node.with_trailing(trailing)),
        }
    }

    /// Same element with both outer trivia edges cleared.
    pub fn trimmed(&self) -> SyntaxElement {
        self.with_leading(Vec::new()).with_trailing(Vec::new())
    }
}

impl From<Arc<SyntaxNode>> for SyntaxElement {
    fn from(node: Arc<SyntaxNode>) -> Self {
        SyntaxElement::Node(node)
    }
}

impl From<SyntaxToken> for SyntaxElement {
    fn from(token: SyntaxToken) -> Self {
        token.into_element()
    }
}

/// A child together with the grammar field it fills, if any
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Child {
    pub field: Option<&'static str>,
    pub element: SyntaxElement,
}

impl Child {
    pub fn new(element: impl Into<SyntaxElement>) -> Self {
        Self {
            field: None,
            element: element.into(),
        }
    }

    pub fn field(field: &'static str, element: impl Into<SyntaxElement>) -> Self {
        Self {
            field: Some(field),
            element: element.into(),
        }
    }

    fn with_element(&self, element: SyntaxElement) -> Self {
        Self {
            field: self.field,
            element,
        }
    }
}

/// An interior node
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SyntaxNode {
    kind: Kind,
    children: Vec<Child>,
    full_len: usize,
}

impl SyntaxNode {
    pub fn new(kind: Kind, children: Vec<Child>) -> Arc<Self> {
        let full_len = children.iter().map(|c| c.element.full_len()).sum();
        Arc::new(Self {
            kind,
            children,
            full_len,
        })
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn full_len(&self) -> usize {
        self.full_len
    }

    /// Width of the leading trivia of the first token.
    pub fn leading_len(&self) -> usize {
        self.first_token()
            .map(|t| trivia::width(t.leading()))
            .unwrap_or(0)
    }

    pub fn child_by_field(&self, field: &str) -> Option<&SyntaxElement> {
        self.children
            .iter()
            .find(|c| c.field == Some(field))
            .map(|c| &c.element)
    }

    pub fn node_by_field(&self, field: &str) -> Option<&Arc<SyntaxNode>> {
        self.child_by_field(field).and_then(SyntaxElement::as_node)
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &Arc<SyntaxNode>> {
        self.children.iter().filter_map(|c| c.element.as_node())
    }

    pub fn child_nodes_of_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = &'a Arc<SyntaxNode>> + 'a {
        self.child_nodes().filter(move |n| n.kind() == kind)
    }

    /// True if a direct child token has exactly this text.
    pub fn has_token(&self, text: &str) -> bool {
        self.children
            .iter()
            .any(|c| c.element.as_token().is_some_and(|t| t.text() == text))
    }

    pub fn first_token(&self) -> Option<&Arc<SyntaxToken>> {
        self.children.iter().find_map(|c| c.element.first_token())
    }

    pub fn last_token(&self) -> Option<&Arc<SyntaxToken>> {
        self.children.iter().rev().find_map(|c| c.element.last_token())
    }

    /// All tokens in source order.
    pub fn tokens(&self) -> Vec<&Arc<SyntaxToken>> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Arc<SyntaxToken>>) {
        for child in &self.children {
            match &child.element {
                SyntaxElement::Token(token) => out.push(token),
                SyntaxElement::Node(node) => node.collect_tokens(out),
            }
        }
    }

    /// True if the subtree contains an error-recovery node.
    pub fn has_error(&self) -> bool {
        self.kind == "ERROR"
            || self.children.iter().any(|c| match &c.element {
                SyntaxElement::Node(node) => node.has_error(),
                SyntaxElement::Token(token) => token.kind() == "ERROR",
            })
    }

    pub fn write_to(&self, out: &mut String) {
        for child in &self.children {
            child.element.write_to(out);
        }
    }

    /// Full source text, trivia included.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.full_len);
        self.write_to(&mut out);
        out
    }

    pub fn token_text(&self) -> String {
        self.tokens().iter().map(|t| t.text()).collect()
    }

    /// A node of the same kind with new children.
    pub fn with_children(&self, children: Vec<Child>) -> Arc<SyntaxNode> {
        SyntaxNode::new(self.kind, children)
    }

    /// Replace the child at `index`, keeping its field name.
    pub fn replace_child(&self, index: usize, element: SyntaxElement) -> Arc<SyntaxNode> {
        let mut children = self.children.clone();
        children[index] = children[index].with_element(element);
        self.with_children(children)
    }

    pub fn remove_children(&self, range: std::ops::Range<usize>) -> Arc<SyntaxNode> {
        let mut children = self.children.clone();
        children.drain(range);
        self.with_children(children)
    }

    pub fn with_leading(&self, leading: Vec<Trivia>) -> Arc<SyntaxNode> {
        match self.children.iter().position(|c| c.element.first_token().is_some()) {
            Some(index) => {
                let element = self.children[index].element.with_leading(leading);
                self.replace_child(index, element)
            }
            None => self.with_children(self.children.clone()),
        }
    }

    pub fn with_trailing(&self, trailing: Vec<Trivia>) -> Arc<SyntaxNode> {
        match self
            .children
            .iter()
            .rposition(|c| c.element.last_token().is_some())
        {
            Some(index) => {
                let element = self.children[index].element.with_trailing(trailing);
                self.replace_child(index, element)
            }
            None => self.with_children(self.children.clone()),
        }
    }
}

/// Root of a document's tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    root: Arc<SyntaxNode>,
}

impl SyntaxTree {
    pub fn new(root: Arc<SyntaxNode>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Arc<SyntaxNode> {
        &self.root
    }

    pub fn text(&self) -> String {
        self.root.text()
    }

    /// True if both trees share the same root allocation.
    pub fn same_root(&self, other: &SyntaxTree) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }
}
