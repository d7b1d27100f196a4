//! Expected-exception restructuring.
//!
//! ```text
//! [TestMethod]                          [TestMethod]
//! [ExpectedException(typeof(E))]        void M()
//! void M()                       =>     {
//! {                                         Assert.Throws<E>(() =>
//!     Run();                                {
//! }                                             Run();
//!                                           });
//!                                       }
//! ```
//!
//! The original block is moved one level deeper without touching anything but
//! line indentation. Methods that carry an expectation this pass cannot
//! express are left alone and reported.

use super::{Pass, PassResult};
use crate::document::Document;
use crate::resolve::Bindings;
use crate::rules::{AttributeRole, AttributeRules, ExceptionRules};
use crate::syntax::trivia::{self, Indenter, Trivia};
use crate::syntax::{ast, build, rewrite, Rewriter, SyntaxElement, SyntaxNode, SyntaxToken};
use crate::{Diagnostic, PassId};
use std::sync::Arc;

const DEFAULT_INDENT: &str = "    ";
const NO_TYPE: &str = "ExpectedException has no typeof(T) argument";

pub struct ExpectedExceptionPass {
    attributes: Arc<AttributeRules>,
    exceptions: Arc<ExceptionRules>,
}

impl ExpectedExceptionPass {
    pub fn new(attributes: Arc<AttributeRules>, exceptions: Arc<ExceptionRules>) -> Self {
        Self {
            attributes,
            exceptions,
        }
    }
}

impl Pass for ExpectedExceptionPass {
    fn id(&self) -> PassId {
        PassId::ExpectedException
    }

    fn apply(&self, document: &Document) -> PassResult {
        let bindings = document.bindings();
        let mut rewriter = ExpectationRewriter {
            pass: self,
            bindings: bindings.as_ref(),
            document,
            diagnostics: Vec::new(),
        };
        let root = rewrite(document.tree().root(), &mut rewriter);
        let diagnostics = rewriter.diagnostics;
        PassResult::from_root(document, root, diagnostics)
    }
}

/// Position of an attribute inside a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AttributeRef {
    /// Child index of the attribute list in the declaration
    list: usize,
    /// Child index of the attribute in its list
    attribute: usize,
}

/// What an `[ExpectedException(...)]` asks for
struct Expectation {
    exception: SyntaxElement,
    allow_derived: bool,
    /// Literal text of the "no exception was thrown" message
    message: Option<String>,
}

struct ExpectationRewriter<'a> {
    pass: &'a ExpectedExceptionPass,
    bindings: &'a dyn Bindings,
    document: &'a Document,
    diagnostics: Vec<Diagnostic>,
}

impl Rewriter for ExpectationRewriter<'_> {
    fn enter(&mut self, node: &Arc<SyntaxNode>, offset: usize) -> Option<Arc<SyntaxNode>> {
        if node.kind() != "method_declaration" {
            return None;
        }
        let (expectations, markers) = self.classify(node);
        let marker = *markers.first()?;
        let expectation = match expectations[..] {
            [] => return None,
            [one] => one,
            _ => {
                self.report(node, offset, "multiple ExpectedException attributes".to_string());
                return None;
            }
        };
        match self.restructure(node, expectation, marker) {
            Ok(method) => {
                tracing::trace!(method = %method_name(node), "wrapped expected exception");
                Some(method)
            }
            Err(message) => {
                self.report(node, offset, message);
                None
            }
        }
    }
}

impl ExpectationRewriter<'_> {
    /// Expectation attributes and test markers of a method, in source order.
    fn classify(&self, method: &SyntaxNode) -> (Vec<AttributeRef>, Vec<AttributeRef>) {
        let mut expectations = Vec::new();
        let mut markers = Vec::new();
        for list_index in ast::attribute_lists(method) {
            let Some(list) = method.children()[list_index].element.as_node() else {
                continue;
            };
            for attribute_index in ast::attributes(list) {
                let Some(identity) = list.children()[attribute_index]
                    .element
                    .as_node()
                    .and_then(|a| self.bindings.resolve(a))
                else {
                    continue;
                };
                let at = AttributeRef {
                    list: list_index,
                    attribute: attribute_index,
                };
                let rules = &self.pass.attributes;
                if rules.roles.lookup(identity.as_str()) == Some(&AttributeRole::ExpectedException) {
                    expectations.push(at);
                } else if rules.is_test_marker(identity.as_str()) {
                    markers.push(at);
                }
            }
        }
        (expectations, markers)
    }

    fn restructure(
        &self,
        method: &Arc<SyntaxNode>,
        expectation: AttributeRef,
        marker: AttributeRef,
    ) -> Result<Arc<SyntaxNode>, String> {
        if method.has_error() {
            return Err("method contains syntax errors".to_string());
        }
        let attribute = attribute_at(method, expectation).ok_or_else(|| NO_TYPE.to_string())?;
        let expectation_args = read_expectation(attribute, &self.pass.exceptions.allow_derived)?;
        let body_index = ast::field_index(method, "body")
            .filter(|&i| method.children()[i].element.kind() == "block")
            .ok_or_else(|| "method has no block body".to_string())?;

        let is_async = ast::has_modifier(method, "async");
        let body = self
            .wrap_body(method, body_index, &expectation_args, is_async)
            .ok_or_else(|| "method body has an unexpected shape".to_string())?;
        let method = method.replace_child(body_index, body.into());

        let (method, list_removed) = remove_attribute(&method, expectation)
            .ok_or_else(|| "removing ExpectedException would drop a comment".to_string())?;
        let marker_list = if list_removed && expectation.list < marker.list {
            marker.list - 1
        } else {
            marker.list
        };
        Ok(move_list_first(&method, marker_list))
    }

    /// The new method body: one throws-assertion wrapping the old block.
    fn wrap_body(
        &self,
        method: &SyntaxNode,
        body_index: usize,
        expectation: &Expectation,
        is_async: bool,
    ) -> Option<Arc<SyntaxNode>> {
        let block = method.children()[body_index].element.as_node()?;
        let children = block.children();
        let open = children.first()?.element.as_token()?;
        let close = children.last()?.element.as_token()?;
        if children.len() < 2 || open.text() != "{" || close.text() != "}" {
            return None;
        }
        let statements = &children[1..children.len() - 1];

        let before_open = method.children()[..body_index]
            .iter()
            .rev()
            .find_map(|c| c.element.last_token());
        let open_starts_line = before_open.map_or(true, |t| trivia::ends_line(t.trailing()));
        let outer = trivia::indentation(open.leading(), open_starts_line)
            .or_else(|| method.first_token().and_then(|t| trivia::indentation(t.leading(), true)))
            .unwrap_or("")
            .to_string();
        let newline = trivia::line_break(open.trailing())
            .or_else(|| before_open.and_then(|t| trivia::line_break(t.trailing())))
            .unwrap_or("\n")
            .to_string();
        let first_indent = statements
            .first()
            .and_then(|s| trivia::indentation(s.element.leading(), trivia::ends_line(open.trailing())));
        let unit = match first_indent {
            Some(indent) if indent.len() > outer.len() && indent.starts_with(outer.as_str()) => {
                indent[outer.len()..].to_string()
            }
            _ => DEFAULT_INDENT.to_string(),
        };
        let inner = format!("{outer}{unit}");
        let line_end = || vec![Trivia::end_of_line(newline.as_str())];

        let mut indenter = Indenter::new(&unit, true);
        let mut nested = Vec::with_capacity(statements.len());
        for (i, child) in statements.iter().enumerate() {
            let mut statement = child.element.clone();
            if i == 0 && first_indent.is_none() {
                let mut leading = indentation(&inner);
                leading.extend_from_slice(statement.leading());
                statement = statement.with_leading(leading);
            }
            if i + 1 == statements.len() && !trivia::ends_line(statement.trailing()) {
                let mut trailing = statement.trailing().to_vec();
                trim_whitespace_end(&mut trailing);
                trailing.extend(line_end());
                statement = statement.with_trailing(trailing);
            }
            let statement = match statement {
                SyntaxElement::Node(node) => SyntaxElement::Node(rewrite::map_tokens(
                    &node,
                    &mut |token: &SyntaxToken| reindent(&mut indenter, token),
                )),
                SyntaxElement::Token(token) => reindent(&mut indenter, &token).into_element(),
            };
            nested.push(statement);
        }

        // Comments before the old closing brace stay inside the nested block.
        let mut close_leading = Vec::new();
        let comments = trivia::strip_final_indentation(close.leading());
        if trivia::has_comments(comments) {
            close_leading = indenter.leading(comments);
            if !trivia::ends_line(&close_leading) {
                trim_whitespace_end(&mut close_leading);
                close_leading.extend(line_end());
            }
        }
        close_leading.extend(indentation(&inner));

        let nested_block = build::block(
            build::token("{").with_leading(indentation(&inner)).with_trailing(line_end()),
            nested,
            build::token("}").with_leading(close_leading),
        );
        let lambda = build::lambda(is_async, line_end(), nested_block.into());

        let rules = &self.pass.exceptions;
        let callee = build::member_access(
            build::identifier(&rules.assert_type).into_element(),
            build::generic_name(
                rules.method(expectation.allow_derived, is_async),
                expectation.exception.clone(),
            )
            .into(),
        );
        let mut expression: SyntaxElement =
            build::invocation(callee.into(), build::argument_list(vec![lambda.into()])).into();
        if is_async {
            expression = build::await_expression(expression).into();
        }
        let mut semicolon_trailing = line_end();
        if let Some(message) = &expectation.message {
            semicolon_trailing = trivia::with_trailing_comment(&semicolon_trailing, &format!("// {message}"))?;
        }
        let statement =
            build::expression_statement(expression, semicolon_trailing).with_leading(indentation(&inner));

        let mut open_trailing = open.trailing().to_vec();
        if !trivia::ends_line(&open_trailing) {
            trim_whitespace_end(&mut open_trailing);
            open_trailing.extend(line_end());
        }
        Some(build::block(
            build::token("{")
                .with_leading(open.leading().to_vec())
                .with_trailing(open_trailing),
            vec![statement.into()],
            build::token("}")
                .with_leading(indentation(&outer))
                .with_trailing(close.trailing().to_vec()),
        ))
    }

    fn report(&mut self, method: &SyntaxNode, offset: usize, message: String) {
        let declaration = method_name(method);
        // Span of the declaration, attributes included, trivia excluded.
        let start = offset + method.leading_len();
        let trailing = method.last_token().map_or(0, |t| trivia::width(t.trailing()));
        let end = (offset + method.full_len()).saturating_sub(trailing).max(start);
        let location = self.document.span_location(start, end);
        tracing::warn!(
            path = %self.document.path().display(),
            %location,
            method = %declaration,
            "{message}"
        );
        self.diagnostics.push(Diagnostic {
            pass: PassId::ExpectedException,
            message,
            location,
            declaration: Some(declaration),
        });
    }
}

fn method_name(method: &SyntaxNode) -> String {
    method
        .child_by_field("name")
        .map(|n| n.token_text())
        .unwrap_or_default()
}

fn attribute_at(method: &SyntaxNode, at: AttributeRef) -> Option<&Arc<SyntaxNode>> {
    method.children()[at.list]
        .element
        .as_node()?
        .children()[at.attribute]
        .element
        .as_node()
}

/// Read `typeof(T)`, an optional literal message and `AllowDerivedTypes`.
fn read_expectation(attribute: &SyntaxNode, allow_derived_name: &str) -> Result<Expectation, String> {
    let list = ast::attribute_arguments(attribute).ok_or_else(|| NO_TYPE.to_string())?;
    let mut positional = Vec::new();
    let mut allow_derived = false;
    for index in ast::list_items(list, "attribute_argument") {
        let element = &list.children()[index].element;
        let unsupported = || format!("unsupported ExpectedException argument `{}`", element.trimmed_text());
        let (name, value) = element
            .as_node()
            .and_then(|a| ast::attribute_argument(a))
            .ok_or_else(unsupported)?;
        match name {
            None => positional.push(value),
            Some(name) if name == allow_derived_name => match value.token_text().as_str() {
                "true" => allow_derived = true,
                "false" => allow_derived = false,
                _ => return Err(unsupported()),
            },
            Some(_) => return Err(unsupported()),
        }
    }

    let exception = positional
        .first()
        .and_then(|v| ast::typeof_type(v))
        .ok_or_else(|| NO_TYPE.to_string())?
        .trimmed();
    let message = match positional.as_slice() {
        [_] => None,
        [_, message] if ast::is_single_line_string(message) => Some(message.trimmed_text()),
        [_, other, ..] => {
            return Err(format!(
                "unsupported ExpectedException argument `{}`",
                other.trimmed_text()
            ))
        }
        [] => return Err(NO_TYPE.to_string()),
    };
    Ok(Expectation {
        exception,
        allow_derived,
        message,
    })
}

/// Delete one attribute. Returns the new declaration and whether its whole
/// attribute list went with it.
fn remove_attribute(method: &SyntaxNode, at: AttributeRef) -> Option<(Arc<SyntaxNode>, bool)> {
    let list = method.children()[at.list].element.as_node()?;
    if ast::attributes(list).len() == 1 {
        return Some((ast::remove_child_merging_trivia(method, at.list)?, true));
    }
    let list = ast::remove_list_item(list, at.attribute)?;
    Some((method.replace_child(at.list, list.into()), false))
}

/// Rotate attribute lists so the one at child index `list` comes first.
/// Every slot keeps its own outer trivia.
fn move_list_first(method: &Arc<SyntaxNode>, list: usize) -> Arc<SyntaxNode> {
    let lists = ast::attribute_lists(method);
    let Some(position) = lists.iter().position(|&i| i == list) else {
        return Arc::clone(method);
    };
    if position == 0 {
        return Arc::clone(method);
    }
    let children = method.children();
    let mut rebuilt = children.to_vec();
    let slots = &lists[..=position];
    for (k, &slot) in slots.iter().enumerate() {
        let source = if k == 0 { list } else { slots[k - 1] };
        let current = &children[slot].element;
        rebuilt[slot].element = children[source]
            .element
            .with_leading(current.leading().to_vec())
            .with_trailing(current.trailing().to_vec());
    }
    method.with_children(rebuilt)
}

fn reindent(indenter: &mut Indenter<'_>, token: &SyntaxToken) -> SyntaxToken {
    let mut leading = indenter.leading(token.leading());
    indenter.token(&mut leading, token.text());
    indenter.trailing(token.trailing());
    token.clone().with_leading(leading)
}

fn indentation(text: &str) -> Vec<Trivia> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Trivia::whitespace(text)]
    }
}

fn trim_whitespace_end(trivia: &mut Vec<Trivia>) {
    while trivia.last().is_some_and(Trivia::is_whitespace) {
        trivia.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::apply;
    use crate::passes::testing::{open, run, run_idempotent, MSTEST_USING};
    use crate::rules::RuleSet;
    use pretty_assertions::assert_eq;

    fn pass() -> ExpectedExceptionPass {
        let rules = RuleSet::mstest_to_xunit();
        ExpectedExceptionPass::new(rules.attributes, rules.exceptions)
    }

    fn class(members: &str) -> String {
        format!("{MSTEST_USING}\npublic class Tests\n{{\n{members}}}\n")
    }

    #[test]
    fn wraps_body_in_throws() {
        let output = run_idempotent(
            &pass(),
            &class(
                "    [TestMethod]
    [ExpectedException(typeof(ArgumentNullException))]
    public void TestA()
    {
        Assert.AreEqual(1, 1);
    }
",
            ),
        );
        assert_eq!(
            output,
            class(
                "    [TestMethod]
    public void TestA()
    {
        Assert.Throws<ArgumentNullException>(() =>
        {
            Assert.AreEqual(1, 1);
        });
    }
"
            )
        );
    }

    #[test]
    fn attribute_order_does_not_matter() {
        let output = run(
            &pass(),
            &class(
                "    [TestMethod]
    [ExpectedException(typeof(E))]
    public void A()
    {
        Run();
    }

    [ExpectedException(typeof(E))]
    [TestMethod]
    public void B()
    {
        Run();
    }
",
            ),
        );
        let wrapped = |name: &str| {
            format!(
                "    [TestMethod]
    public void {name}()
    {{
        Assert.Throws<E>(() =>
        {{
            Run();
        }});
    }}
"
            )
        };
        assert_eq!(output, class(&format!("{}\n{}", wrapped("A"), wrapped("B"))));
    }

    #[test]
    fn marker_list_moves_first() {
        let output = run(
            &pass(),
            &class(
                "    [ExpectedException(typeof(E))]
    [Description(\"d\")]
    [TestMethod]
    public void A()
    {
        Run();
    }
",
            ),
        );
        assert!(
            output.contains("    [TestMethod]\n    [Description(\"d\")]\n    public void A()"),
            "{output}"
        );
    }

    #[test]
    fn shared_attribute_list() {
        let output = run(
            &pass(),
            &class("    [TestMethod, ExpectedException(typeof(E))]\n    public void A() { Run(); }\n"),
        );
        assert_eq!(
            output,
            class(
                "    [TestMethod]
    public void A() {
        Assert.Throws<E>(() =>
        {
            Run();
        });
    }
"
            )
        );
    }

    #[test]
    fn nests_statements_and_comments_one_level_deeper() {
        let output = run(
            &pass(),
            &class(
                "    [TestMethod]
    [ExpectedException(typeof(E))]
    public void A()
    {
        var x = 1;
        // check
        Assert.AreEqual(1, x);
        // done
    }
",
            ),
        );
        assert_eq!(
            output,
            class(
                "    [TestMethod]
    public void A()
    {
        Assert.Throws<E>(() =>
        {
            var x = 1;
            // check
            Assert.AreEqual(1, x);
            // done
        });
    }
"
            )
        );
    }

    #[test]
    fn accepts_an_already_converted_marker() {
        let source = format!(
            "using Xunit;\n{}",
            class(
                "    [Fact]
    [ExpectedException(typeof(E))]
    public void A()
    {
        Run();
    }
"
            )
        );
        let output = run(&pass(), &source);
        assert!(output.contains("    [Fact]\n    public void A()"), "{output}");
        assert!(output.contains("Assert.Throws<E>(() =>"), "{output}");
    }

    #[test]
    fn async_methods_await_throws_async() {
        let output = run_idempotent(
            &pass(),
            &class(
                "    [TestMethod]
    [ExpectedException(typeof(E))]
    public async Task A()
    {
        await RunAsync();
    }
",
            ),
        );
        assert!(
            output.contains(
                "        await Assert.ThrowsAsync<E>(async () =>
        {
            await RunAsync();
        });
"
            ),
            "{output}"
        );
    }

    #[test]
    fn derived_types_and_message() {
        let output = run(
            &pass(),
            &class(
                "    [TestMethod]
    [ExpectedException(typeof(E), \"should throw\", AllowDerivedTypes = true)]
    public void A()
    {
        Run();
    }
",
            ),
        );
        assert!(output.contains("Assert.ThrowsAny<E>(() =>"), "{output}");
        assert!(output.contains("        }); // \"should throw\"\n"), "{output}");
    }

    #[test]
    fn anomalies_are_reported_and_isolated() {
        let source = class(
            "    [TestMethod]
    [ExpectedException(ExceptionType)]
    public void NoType()
    {
        Run();
    }

    [TestMethod]
    [ExpectedException(typeof(E))]
    public void Arrow() => Run();

    [TestMethod]
    [ExpectedException(typeof(E), Unknown = 1)]
    public void Named()
    {
        Run();
    }

    [TestMethod]
    [ExpectedException(typeof(E))]
    public void Good()
    {
        Run();
    }
",
        );
        let result = apply(&pass(), &open(&source));
        let names: Vec<_> = result
            .diagnostics
            .iter()
            .map(|d| d.declaration.clone().unwrap())
            .collect();
        assert_eq!(names, ["NoType", "Arrow", "Named"]);
        assert!(result.diagnostics.iter().all(|d| d.pass == PassId::ExpectedException));
        let location = result.diagnostics[0].location;
        assert_eq!((location.line, location.column), (5, 5));
        assert_eq!((location.end_line, location.end_column), (Some(10), Some(6)));

        let text = result.document.text();
        assert!(text.contains("[ExpectedException(ExceptionType)]"));
        assert!(text.contains("public void Arrow() => Run();"));
        assert!(text.contains("[ExpectedException(typeof(E), Unknown = 1)]"));
        assert_eq!(text.matches("Assert.Throws<E>").count(), 1);
    }

    #[test]
    fn untouched_without_a_test_marker() {
        let source = class(
            "    [ExpectedException(typeof(E))]
    public void Helper()
    {
        Run();
    }
",
        );
        let result = apply(&pass(), &open(&source));
        assert!(!result.changed);
        assert!(result.diagnostics.is_empty());
    }
}
