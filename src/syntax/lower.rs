//! Conversion from a tree-sitter concrete tree to a [`SyntaxTree`].
//!
//! tree-sitter reports tokens by byte range and leaves whitespace out of the
//! tree entirely; comments and some preprocessor lines show up as "extra"
//! nodes anywhere. Lowering walks the tree once, collects tokens into an arena
//! together with the gap that precedes each one, then hands every gap out as
//! trailing trivia of the token before it (up to the first line break) and
//! leading trivia of the token after it.

use super::tree::{Child, Kind, SyntaxNode, SyntaxToken, SyntaxTree, END_OF_FILE};
use super::trivia::{self, Trivia, TriviaKind};
use tree_sitter::TreeCursor;

enum Raw {
    Node {
        kind: Kind,
        children: Vec<(Option<&'static str>, Raw)>,
    },
    Token(usize),
}

struct Lowering<'s> {
    source: &'s str,
    pos: usize,
    tokens: Vec<SyntaxToken>,
    /// Trivia that precedes `tokens[i]`; one extra entry for end of file.
    gaps: Vec<Vec<Trivia>>,
    pending: Vec<Trivia>,
}

impl<'s> Lowering<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            pos: 0,
            tokens: Vec::new(),
            gaps: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Consume the unclaimed text up to `offset` as whitespace trivia.
    fn advance_to(&mut self, offset: usize) {
        if offset > self.pos {
            trivia::classify_gap(&self.source[self.pos..offset], &mut self.pending);
            self.pos = offset;
        }
    }

    /// Clamp a byte range so it never overlaps text already claimed.
    fn claim(&mut self, start: usize, end: usize) -> Option<(usize, usize)> {
        let end = end.min(self.source.len());
        if end <= self.pos || start >= end {
            return None;
        }
        let start = start.max(self.pos);
        self.advance_to(start);
        self.pos = end;
        Some((start, end))
    }

    fn extra(&mut self, kind: Kind, start: usize, end: usize) {
        if let Some((start, end)) = self.claim(start, end) {
            let trivia_kind = if kind == "comment" {
                TriviaKind::Comment
            } else {
                TriviaKind::Directive
            };
            self.pending
                .push(Trivia::new(trivia_kind, &self.source[start..end]));
        }
    }

    fn token(&mut self, kind: Kind, start: usize, end: usize) -> Option<usize> {
        let (start, end) = self.claim(start, end)?;
        self.gaps.push(std::mem::take(&mut self.pending));
        self.tokens
            .push(SyntaxToken::new(kind, &self.source[start..end]));
        Some(self.tokens.len() - 1)
    }

    fn node(&mut self, cursor: &mut TreeCursor<'_>) -> Option<Raw> {
        let node = cursor.node();
        if node.is_missing() {
            return None;
        }
        if node.is_extra() && node.parent().is_some() {
            self.extra(node.kind(), node.start_byte(), node.end_byte());
            return None;
        }
        if node.child_count() == 0 {
            return self
                .token(node.kind(), node.start_byte(), node.end_byte())
                .map(Raw::Token);
        }
        let mut children = Vec::new();
        if cursor.goto_first_child() {
            loop {
                let field = cursor.field_name();
                if let Some(child) = self.node(cursor) {
                    children.push((field, child));
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
            cursor.goto_parent();
        }
        Some(Raw::Node {
            kind: node.kind(),
            children,
        })
    }

    /// Split every gap between the token before it and the token after it.
    fn attach_trivia(&mut self) {
        let end = self.source.len();
        self.advance_to(end);
        self.gaps.push(std::mem::take(&mut self.pending));
        self.tokens.push(SyntaxToken::new(END_OF_FILE, ""));

        for i in 0..self.tokens.len() {
            let mut gap = std::mem::take(&mut self.gaps[i]);
            if i > 0 && !self.tokens[i - 1].text().ends_with('\n') {
                let split = gap
                    .iter()
                    .position(Trivia::ends_line)
                    .map(|p| p + 1)
                    .unwrap_or(gap.len());
                let leading = gap.split_off(split);
                let previous = std::mem::replace(&mut self.tokens[i - 1], SyntaxToken::new("", ""));
                self.tokens[i - 1] = previous.with_trailing(gap);
                gap = leading;
            }
            let token = std::mem::replace(&mut self.tokens[i], SyntaxToken::new("", ""));
            self.tokens[i] = token.with_leading(gap);
        }
    }

    fn build(tokens: &mut [Option<SyntaxToken>], raw: Raw) -> Child {
        match raw {
            Raw::Token(index) => Child::new(tokens[index].take().unwrap_or_else(|| SyntaxToken::new("", ""))),
            Raw::Node { kind, children } => {
                let children = children
                    .into_iter()
                    .map(|(field, raw)| {
                        let mut child = Self::build(tokens, raw);
                        child.field = field;
                        child
                    })
                    .collect();
                Child::new(SyntaxNode::new(kind, children))
            }
        }
    }
}

/// Lower a parsed tree-sitter tree over `source` into a lossless [`SyntaxTree`].
///
/// The result always serializes back to `source` byte for byte.
pub fn lower(tree: &tree_sitter::Tree, source: &str) -> SyntaxTree {
    let mut lowering = Lowering::new(source);
    let mut cursor = tree.walk();
    let root = cursor.node();
    let raw = lowering.node(&mut cursor).unwrap_or(Raw::Node {
        kind: root.kind(),
        children: Vec::new(),
    });
    lowering.attach_trivia();

    let mut tokens: Vec<Option<SyntaxToken>> = lowering.tokens.into_iter().map(Some).collect();
    let end_of_file = tokens
        .pop()
        .flatten()
        .unwrap_or_else(|| SyntaxToken::new(END_OF_FILE, ""));

    let (kind, mut children) = match raw {
        Raw::Node { kind, children } => (kind, children),
        token @ Raw::Token(_) => (root.kind(), vec![(None, token)]),
    };
    let mut built: Vec<Child> = children
        .drain(..)
        .map(|(field, raw)| {
            let mut child = Lowering::build(&mut tokens, raw);
            child.field = field;
            child
        })
        .collect();
    built.push(Child::new(end_of_file));
    SyntaxTree::new(SyntaxNode::new(kind, built))
}
