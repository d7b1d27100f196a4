//! Assertion message demotion and type-check reshaping.
//!
//! `Assert.AreEqual(a, b, "msg");` loses its message argument, which comes
//! back as a `// "msg"` comment after the statement, and
//! `Assert.IsInstanceOfType(x, typeof(T))` becomes `Assert.IsType<T>(x)`.
//! Both transforms share one resolution step per expression statement.

use super::{Pass, PassResult};
use crate::document::Document;
use crate::resolve::Matcher;
use crate::rules::{ArgumentTransform, AssertTarget, RuleEntry, RuleTable};
use crate::syntax::{ast, build, rewrite, trivia, Rewriter, SyntaxElement, SyntaxNode};
use crate::PassId;
use std::sync::Arc;

/// Message/type demoter
pub struct AssertionPass {
    table: Arc<RuleTable<RuleEntry>>,
    target: Arc<AssertTarget>,
}

impl AssertionPass {
    pub fn new(table: Arc<RuleTable<RuleEntry>>, target: Arc<AssertTarget>) -> Self {
        Self { table, target }
    }
}

impl Pass for AssertionPass {
    fn id(&self) -> PassId {
        PassId::Assertions
    }

    fn apply(&self, document: &Document) -> PassResult {
        let bindings = document.bindings();
        let mut rewriter = AssertionRewriter {
            matcher: Matcher::new(bindings.as_ref(), &self.table),
            target: &self.target,
        };
        let root = rewrite(document.tree().root(), &mut rewriter);
        PassResult::from_root(document, root, Vec::new())
    }
}

struct AssertionRewriter<'a> {
    matcher: Matcher<'a, RuleEntry>,
    target: &'a AssertTarget,
}

impl Rewriter for AssertionRewriter<'_> {
    fn leave(
        &mut self,
        original: &Arc<SyntaxNode>,
        rebuilt: &Arc<SyntaxNode>,
        _offset: usize,
    ) -> Option<Arc<SyntaxNode>> {
        let call = ast::statement_invocation(original)?;
        let (name, entry) = self.matcher.find(call)?;
        let statement = rewrite_statement(rebuilt, entry, self.target)?;
        tracing::trace!(%name, "rewrote assertion");
        Some(statement)
    }
}

/// Apply demotion and reshaping to an expression statement.
///
/// `None` means the statement does not fit the rule and stays as it is.
fn rewrite_statement(
    statement: &Arc<SyntaxNode>,
    entry: &RuleEntry,
    target: &AssertTarget,
) -> Option<Arc<SyntaxNode>> {
    if statement.has_error() {
        return None;
    }
    let call_index = statement
        .children()
        .iter()
        .position(|c| c.element.kind() == "invocation_expression")?;
    let semicolon_index = statement.children().len() - 1;
    let semicolon = statement.children()[semicolon_index].element.as_token()?;
    if semicolon.text() != ";" {
        return None;
    }

    let mut call = Arc::clone(statement.children()[call_index].element.as_node()?);
    let mut list = Arc::clone(call.node_by_field("arguments")?);
    let mut count = ast::positional_arguments(&list)?.len();
    let mut semicolon_trailing = None;

    if count == entry.arity + 1 {
        let (new_list, trailing) = demote_message(&list, semicolon.trailing())?;
        list = new_list;
        semicolon_trailing = Some(trailing);
        count -= 1;
    }
    if count != entry.arity {
        return None;
    }

    let mut reshaped = false;
    if let (Some(ArgumentTransform::TypeArgument { index }), Some(rename)) =
        (entry.transform, entry.rename.as_deref())
    {
        if let Some((function, new_list)) = reshape_type_check(&call, &list, index, rename, target) {
            call = ast::replace_field(&call, "function", function)?;
            list = new_list;
            reshaped = true;
        }
    }
    if semicolon_trailing.is_none() && !reshaped {
        return None;
    }

    call = ast::replace_field(&call, "arguments", list.into())?;
    let mut statement = statement.replace_child(call_index, call.into());
    if let Some(trailing) = semicolon_trailing {
        let semicolon = build::token(";")
            .with_leading(semicolon.leading().to_vec())
            .with_trailing(trailing);
        statement = statement.replace_child(semicolon_index, semicolon.into_element());
    }
    Some(statement)
}

/// Drop the final literal argument and turn it into a trailing comment.
///
/// Returns the new argument list and the new trailing trivia of the `;`.
fn demote_message(
    list: &Arc<SyntaxNode>,
    semicolon_trailing: &[trivia::Trivia],
) -> Option<(Arc<SyntaxNode>, Vec<trivia::Trivia>)> {
    let arguments = ast::positional_arguments(list)?;
    let message = arguments.last()?;
    if !ast::is_single_line_string(message) {
        return None;
    }
    let comment = format!("// {}", message.trimmed_text());
    let trailing = trivia::with_trailing_comment(semicolon_trailing, &comment)?;
    let last = *ast::list_items(list, "argument").last()?;
    let list = ast::remove_list_item(list, last)?;
    Some((list, trailing))
}

/// `Assert.IsInstanceOfType(x, typeof(T))` to `Assert.IsType<T>(x)`.
///
/// Returns the new callee and argument list.
fn reshape_type_check(
    call: &SyntaxNode,
    list: &Arc<SyntaxNode>,
    index: usize,
    rename: &str,
    target: &AssertTarget,
) -> Option<(SyntaxElement, Arc<SyntaxNode>)> {
    let access = call.node_by_field("function")?;
    if access.kind() != "member_access_expression" || !access.has_token(".") {
        return None;
    }
    let name = access.child_by_field("name")?;
    if name.kind() != "identifier" {
        return None;
    }
    let arguments = ast::positional_arguments(list)?;
    let type_argument = ast::typeof_type(arguments.get(index)?)?.trimmed();
    let item = *ast::list_items(list, "argument").get(index)?;
    let list = ast::remove_list_item(list, item)?;

    let generic = build::generic_name(rename, type_argument)
        .with_leading(name.leading().to_vec())
        .with_trailing(name.trailing().to_vec());
    let access = ast::replace_field(access, "name", generic.into())?;
    let access = super::with_receiver(&access, target)?;
    Some((access.into(), list))
}
