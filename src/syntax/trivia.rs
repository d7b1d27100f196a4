//! Incidental formatting attached to tokens.
//!
//! Trivia never carries meaning for the passes, but it has to round-trip byte
//! for byte. The helpers here are the only places where trivia is moved or
//! synthesized: removing a declaration-level element, re-indenting a nested
//! block, and appending a trailing comment before a line break.

/// Kind of a trivia fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    /// Spaces, tabs and other non-newline whitespace
    Whitespace,
    /// `\n`, `\r\n` or `\r`
    EndOfLine,
    /// `// ...` or `/* ... */`
    Comment,
    /// Preprocessor lines the grammar treats as extras (`#region`, `#pragma`, ...)
    Directive,
    /// Source bytes no token claimed (error recovery)
    Skipped,
}

/// A single trivia fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trivia {
    kind: TriviaKind,
    text: String,
}

impl Trivia {
    pub fn new(kind: TriviaKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Self::new(TriviaKind::Whitespace, text)
    }

    pub fn end_of_line(text: impl Into<String>) -> Self {
        Self::new(TriviaKind::EndOfLine, text)
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::new(TriviaKind::Comment, text)
    }

    pub fn kind(&self) -> TriviaKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_comment(&self) -> bool {
        self.kind == TriviaKind::Comment
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TriviaKind::Whitespace
    }

    /// True if the source continues on a new line after this fragment.
    pub fn ends_line(&self) -> bool {
        match self.kind {
            TriviaKind::EndOfLine => true,
            TriviaKind::Directive | TriviaKind::Skipped => self.text.ends_with('\n'),
            _ => false,
        }
    }
}

/// Split a run of unclaimed source text into whitespace and line-break fragments.
///
/// Anything that is neither whitespace nor a line break becomes `Skipped`.
pub fn classify_gap(text: &str, out: &mut Vec<Trivia>) {
    let mut rest = text;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("\r\n") {
            out.push(Trivia::end_of_line("\r\n"));
            rest = after;
            continue;
        }
        let first = rest.chars().next().unwrap_or('\n');
        if first == '\n' || first == '\r' {
            out.push(Trivia::end_of_line(&rest[..1]));
            rest = &rest[1..];
            continue;
        }
        let kind = if first.is_whitespace() {
            TriviaKind::Whitespace
        } else {
            TriviaKind::Skipped
        };
        let end = rest
            .char_indices()
            .find(|&(_, c)| c == '\n' || c == '\r' || (c.is_whitespace() != (kind == TriviaKind::Whitespace)))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        out.push(Trivia::new(kind, &rest[..end]));
        rest = &rest[end..];
    }
}

/// Total byte width of a trivia list
pub fn width(trivia: &[Trivia]) -> usize {
    trivia.iter().map(|t| t.text.len()).sum()
}

pub fn has_comments(trivia: &[Trivia]) -> bool {
    trivia.iter().any(Trivia::is_comment)
}

pub fn ends_line(trivia: &[Trivia]) -> bool {
    trivia.iter().any(Trivia::ends_line)
}

/// First line-break text found in the list, if any.
pub fn line_break(trivia: &[Trivia]) -> Option<&str> {
    trivia
        .iter()
        .find(|t| t.kind == TriviaKind::EndOfLine)
        .map(|t| t.text.as_str())
}

/// The indentation that ends a leading-trivia list, when the token starts its line.
///
/// `after_line_break` tells whether the previous token's trailing trivia ended
/// the line (the list then starts at column zero).
pub fn indentation(leading: &[Trivia], after_line_break: bool) -> Option<&str> {
    match leading.split_last() {
        None => after_line_break.then_some(""),
        Some((last, rest)) if last.is_whitespace() => {
            let at_line_start = match rest.last() {
                None => after_line_break,
                Some(prev) => prev.ends_line(),
            };
            at_line_start.then_some(last.text.as_str())
        }
        Some((last, _)) => last.ends_line().then_some(""),
    }
}

/// Leading trivia of the element that follows a removed element.
///
/// `removed_leading` and `removed_trailing` belong to the removed element,
/// `next_leading` to the element that now takes its place. Comments survive in
/// their original order; the removed element's own line disappears.
pub fn merge_removed(
    removed_leading: &[Trivia],
    removed_trailing: &[Trivia],
    next_leading: &[Trivia],
) -> Vec<Trivia> {
    let mut merged = Vec::with_capacity(removed_leading.len() + next_leading.len() + 2);
    if has_comments(removed_trailing) {
        merged.extend_from_slice(removed_leading);
        let first_comment = removed_trailing
            .iter()
            .position(Trivia::is_comment)
            .unwrap_or(0);
        merged.extend_from_slice(&removed_trailing[first_comment..]);
    } else if ends_line(removed_trailing) {
        merged.extend_from_slice(strip_final_indentation(removed_leading));
    } else {
        merged.extend_from_slice(removed_leading);
    }
    merged.extend_from_slice(next_leading);
    merged
}

/// Drop the whitespace that indents the token owning this leading trivia.
pub fn strip_final_indentation(leading: &[Trivia]) -> &[Trivia] {
    match leading.split_last() {
        Some((last, rest)) if last.is_whitespace() => rest,
        _ => leading,
    }
}

/// Insert `comment` before the first line break of a trailing-trivia list.
///
/// Returns `None` when the list has no line break, because a line comment
/// would then swallow whatever follows on the same line.
pub fn with_trailing_comment(trailing: &[Trivia], comment: &str) -> Option<Vec<Trivia>> {
    let at = trailing.iter().position(Trivia::ends_line)?;
    let mut out = Vec::with_capacity(trailing.len() + 2);
    out.extend_from_slice(&trailing[..at]);
    out.push(Trivia::whitespace(" "));
    out.push(Trivia::comment(comment));
    out.extend_from_slice(&trailing[at..]);
    Some(out)
}

/// Line-start aware indenter used when a block is nested one level deeper.
///
/// Feed it every token's leading trivia, text and trailing trivia in source
/// order; whitespace that begins a line is prefixed with `unit`.
#[derive(Debug)]
pub struct Indenter<'a> {
    unit: &'a str,
    at_line_start: bool,
}

impl<'a> Indenter<'a> {
    pub fn new(unit: &'a str, at_line_start: bool) -> Self {
        Self {
            unit,
            at_line_start,
        }
    }

    /// Re-indent a leading-trivia list for a token whose text follows it.
    pub fn leading(&mut self, leading: &[Trivia]) -> Vec<Trivia> {
        let mut out = Vec::with_capacity(leading.len() + 1);
        for piece in leading {
            if self.at_line_start {
                match piece.kind {
                    TriviaKind::EndOfLine => {
                        out.push(piece.clone());
                        continue;
                    }
                    TriviaKind::Whitespace => {
                        out.push(Trivia::whitespace(format!("{}{}", self.unit, piece.text)));
                        self.at_line_start = false;
                        continue;
                    }
                    _ => {
                        out.push(Trivia::whitespace(self.unit));
                        self.at_line_start = false;
                    }
                }
            }
            out.push(piece.clone());
            self.at_line_start = piece.ends_line();
        }
        out
    }

    /// Indent the token itself if nothing in its leading trivia did.
    pub fn token(&mut self, leading: &mut Vec<Trivia>, text: &str) {
        if self.at_line_start && !text.is_empty() {
            leading.push(Trivia::whitespace(self.unit));
        }
        if !text.is_empty() {
            self.at_line_start = text.ends_with('\n');
        }
    }

    pub fn trailing(&mut self, trailing: &[Trivia]) {
        for piece in trailing {
            if piece.ends_line() {
                self.at_line_start = true;
            } else if !piece.is_whitespace() {
                self.at_line_start = false;
            }
        }
    }
}
