//! Factory functions for synthesized syntax.
//!
//! Built nodes carry no trivia except single spaces that the C# layout
//! conventions require between tokens (`x => y`, `Skip = "..."`). Callers move
//! the replaced node's outer trivia onto the result.

use super::tree::{Child, SyntaxElement, SyntaxNode, SyntaxToken};
use super::trivia::Trivia;
use std::sync::Arc;

/// A punctuation or keyword token; the kind is the token text.
pub fn token(text: &'static str) -> SyntaxToken {
    SyntaxToken::new(text, text)
}

pub fn identifier(name: &str) -> SyntaxToken {
    SyntaxToken::new("identifier", name)
}

fn space() -> Vec<Trivia> {
    vec![Trivia::whitespace(" ")]
}

/// `a.b.c` as an identifier or a left-nested `qualified_name`.
pub fn qualified_name(dotted: &str) -> SyntaxElement {
    let mut parts = dotted.split('.');
    let mut name = identifier(parts.next().unwrap_or_default()).into_element();
    for part in parts {
        name = SyntaxNode::new(
            "qualified_name",
            vec![
                Child::field("qualifier", name),
                Child::new(token(".")),
                Child::field("name", identifier(part)),
            ],
        )
        .into();
    }
    name
}

/// `Name<T>`
pub fn generic_name(name: &str, type_argument: SyntaxElement) -> Arc<SyntaxNode> {
    let arguments = SyntaxNode::new(
        "type_argument_list",
        vec![
            Child::new(token("<")),
            Child::new(type_argument),
            Child::new(token(">")),
        ],
    );
    SyntaxNode::new(
        "generic_name",
        vec![Child::new(identifier(name)), Child::new(arguments)],
    )
}

/// `receiver.name`
pub fn member_access(receiver: SyntaxElement, name: SyntaxElement) -> Arc<SyntaxNode> {
    SyntaxNode::new(
        "member_access_expression",
        vec![
            Child::field("expression", receiver),
            Child::new(token(".")),
            Child::field("name", name),
        ],
    )
}

/// `(a, b, ...)` with a single space after each comma.
pub fn argument_list(arguments: Vec<SyntaxElement>) -> Arc<SyntaxNode> {
    let mut children = vec![Child::new(token("("))];
    for (i, expression) in arguments.into_iter().enumerate() {
        if i > 0 {
            children.push(Child::new(token(",").with_trailing(space())));
        }
        children.push(Child::new(SyntaxNode::new(
            "argument",
            vec![Child::new(expression)],
        )));
    }
    children.push(Child::new(token(")")));
    SyntaxNode::new("argument_list", children)
}

pub fn invocation(function: SyntaxElement, arguments: Arc<SyntaxNode>) -> Arc<SyntaxNode> {
    SyntaxNode::new(
        "invocation_expression",
        vec![
            Child::field("function", function),
            Child::field("arguments", arguments),
        ],
    )
}

/// `() => body`, or `async () => body`.
///
/// `arrow_trailing` is attached after `=>`, which is where a block body's
/// line break goes.
pub fn lambda(is_async: bool, arrow_trailing: Vec<Trivia>, body: SyntaxElement) -> Arc<SyntaxNode> {
    let mut children = Vec::with_capacity(4);
    if is_async {
        let modifier = SyntaxNode::new(
            "modifier",
            vec![Child::new(token("async").with_trailing(space()))],
        );
        children.push(Child::new(modifier));
    }
    let parameters = SyntaxNode::new(
        "parameter_list",
        vec![Child::new(token("(")), Child::new(token(")"))],
    );
    children.push(Child::field("parameters", parameters));
    children.push(Child::new(
        token("=>").with_leading(space()).with_trailing(arrow_trailing),
    ));
    children.push(Child::field("body", body));
    SyntaxNode::new("lambda_expression", children)
}

/// `await expression`
pub fn await_expression(expression: SyntaxElement) -> Arc<SyntaxNode> {
    SyntaxNode::new(
        "await_expression",
        vec![
            Child::new(token("await").with_trailing(space())),
            Child::new(expression),
        ],
    )
}

/// `expression;` where the `;` carries `semicolon_trailing`.
pub fn expression_statement(
    expression: SyntaxElement,
    semicolon_trailing: Vec<Trivia>,
) -> Arc<SyntaxNode> {
    SyntaxNode::new(
        "expression_statement",
        vec![
            Child::new(expression),
            Child::new(token(";").with_trailing(semicolon_trailing)),
        ],
    )
}

/// `{ statements }` from already laid-out braces and statements.
pub fn block(open: SyntaxToken, statements: Vec<SyntaxElement>, close: SyntaxToken) -> Arc<SyntaxNode> {
    let mut children = Vec::with_capacity(statements.len() + 2);
    children.push(Child::new(open));
    children.extend(statements.into_iter().map(Child::new));
    children.push(Child::new(close));
    SyntaxNode::new("block", children)
}

/// A regular string literal holding `value`.
pub fn string_literal(value: &str) -> Arc<SyntaxNode> {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    let mut children = vec![Child::new(token("\""))];
    if !escaped.is_empty() {
        children.push(Child::new(SyntaxToken::new(
            "string_literal_content",
            escaped,
        )));
    }
    children.push(Child::new(token("\"")));
    SyntaxNode::new("string_literal", children)
}

/// `(Name = "value")`
pub fn named_attribute_arguments(name: &str, value: &str) -> Arc<SyntaxNode> {
    let argument = SyntaxNode::new(
        "attribute_argument",
        vec![
            Child::new(identifier(name).with_trailing(space())),
            Child::new(token("=").with_trailing(space())),
            Child::new(string_literal(value)),
        ],
    );
    SyntaxNode::new(
        "attribute_argument_list",
        vec![
            Child::new(token("(")),
            Child::new(argument),
            Child::new(token(")")),
        ],
    )
}

/// `using Namespace;`
pub fn using_directive(namespace: &str) -> Arc<SyntaxNode> {
    SyntaxNode::new(
        "using_directive",
        vec![
            Child::new(token("using").with_trailing(space())),
            Child::new(qualified_name(namespace)),
            Child::new(token(";")),
        ],
    )
}
