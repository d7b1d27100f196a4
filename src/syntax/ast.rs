//! Typed accessors over the untyped tree for the C# shapes the passes match.

use super::tree::{Child, SyntaxElement, SyntaxNode};
use super::trivia;
use std::sync::Arc;

/// Type declarations whose attributes the passes inspect
pub const TYPE_DECLARATIONS: &[&str] = &["class_declaration", "struct_declaration", "record_declaration"];

/// The invocation an expression statement consists of, if any.
pub fn statement_invocation(statement: &SyntaxNode) -> Option<&Arc<SyntaxNode>> {
    if statement.kind() != "expression_statement" {
        return None;
    }
    statement
        .child_nodes()
        .next()
        .filter(|n| n.kind() == "invocation_expression")
}

/// Index of the child filling `field`.
pub fn field_index(node: &SyntaxNode, field: &str) -> Option<usize> {
    node.children().iter().position(|c| c.field == Some(field))
}

/// Replace the child filling `field`.
pub fn replace_field(node: &SyntaxNode, field: &str, element: SyntaxElement) -> Option<Arc<SyntaxNode>> {
    let index = field_index(node, field)?;
    Some(node.replace_child(index, element))
}

/// Child indices of the items of a comma-separated list node.
pub fn list_items(list: &SyntaxNode, item_kind: &str) -> Vec<usize> {
    list.children()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.element.kind() == item_kind)
        .map(|(i, _)| i)
        .collect()
}

/// The expression of an argument that has no name, no `ref`/`out`/`in` and
/// nothing else in front of it.
pub fn positional_expression(argument: &SyntaxNode) -> Option<&SyntaxElement> {
    match argument.children() {
        [only] => Some(&only.element),
        _ => None,
    }
}

/// The positional expressions of an argument list.
///
/// `None` if any argument is named or passed by reference.
pub fn positional_arguments(list: &SyntaxNode) -> Option<Vec<&SyntaxElement>> {
    list_items(list, "argument")
        .into_iter()
        .map(|i| {
            list.children()[i]
                .element
                .as_node()
                .and_then(|a| positional_expression(a))
        })
        .collect()
}

/// True for a string literal token that fits on one line.
pub fn is_single_line_string(expression: &SyntaxElement) -> bool {
    let is_string = matches!(
        expression.kind(),
        "string_literal" | "verbatim_string_literal" | "raw_string_literal"
    );
    let has_error = expression.as_node().is_some_and(|n| n.has_error());
    is_string && !has_error && !expression.trimmed_text().contains(['\n', '\r'])
}

/// The `T` of `typeof(T)`.
pub fn typeof_type(expression: &SyntaxElement) -> Option<&SyntaxElement> {
    let node = expression.as_node()?;
    if node.kind() != "typeof_expression" {
        return None;
    }
    node.child_by_field("type")
}

/// Remove the list item at child index `index` together with one separating
/// comma: the one before it, or the one after it for the first item.
///
/// `None` if a comment would be lost.
pub fn remove_list_item(list: &SyntaxNode, index: usize) -> Option<Arc<SyntaxNode>> {
    let children = list.children();
    let is_comma = |i: usize| {
        children
            .get(i)
            .and_then(|c| c.element.as_token())
            .is_some_and(|t| t.text() == ",")
    };
    let range = if index > 0 && is_comma(index - 1) {
        index - 1..index + 1
    } else if is_comma(index + 1) {
        index..index + 2
    } else {
        index..index + 1
    };
    if children[range.clone()].iter().any(|c| c.element.has_comments()) {
        return None;
    }

    let leading_slot = range.start == index && range.end > index + 1;
    let mut rebuilt = children.to_vec();
    if leading_slot {
        // The next item takes the removed item's place and its leading trivia.
        let next = range.end;
        if let Some(child) = rebuilt.get_mut(next) {
            child.element = child.element.with_leading(children[index].element.leading().to_vec());
        }
    }
    rebuilt.drain(range);
    Some(list.with_children(rebuilt))
}

/// Swap the contents of two list items, each slot keeping its outer trivia.
pub fn swap_list_items(list: &SyntaxNode, a: usize, b: usize) -> Arc<SyntaxNode> {
    let children = list.children();
    let first = &children[a].element;
    let second = &children[b].element;
    let new_first = second
        .with_leading(first.leading().to_vec())
        .with_trailing(first.trailing().to_vec());
    let new_second = first
        .with_leading(second.leading().to_vec())
        .with_trailing(second.trailing().to_vec());
    let mut rebuilt = children.to_vec();
    rebuilt[a].element = new_first;
    rebuilt[b].element = new_second;
    list.with_children(rebuilt)
}

/// Remove a declaration-level child (attribute list, using directive, ...)
/// and hand its comments and line structure to the element after it.
///
/// `None` if nothing follows the removed child.
pub fn remove_child_merging_trivia(node: &SyntaxNode, index: usize) -> Option<Arc<SyntaxNode>> {
    let children = node.children();
    let removed = &children.get(index)?.element;
    let next_index = (index + 1..children.len()).find(|&i| children[i].element.first_token().is_some())?;
    let next = &children[next_index].element;
    let starts_line = children[..index]
        .iter()
        .rev()
        .find_map(|c| c.element.last_token())
        .map_or(true, |t| trivia::ends_line(t.trailing()))
        || trivia::ends_line(removed.leading());
    let merged = if starts_line || !trivia::ends_line(removed.trailing()) {
        trivia::merge_removed(removed.leading(), removed.trailing(), next.leading())
    } else {
        // The removed element shared a line with its predecessor, whose line
        // break it carried.
        let mut merged = Vec::new();
        if trivia::has_comments(removed.leading()) {
            merged.extend_from_slice(removed.leading());
        }
        let from = removed
            .trailing()
            .iter()
            .position(|t| !t.is_whitespace())
            .unwrap_or(0);
        merged.extend_from_slice(&removed.trailing()[from..]);
        merged.extend_from_slice(next.leading());
        merged
    };
    let mut rebuilt: Vec<Child> = children.to_vec();
    rebuilt[next_index].element = next.with_leading(merged);
    rebuilt.remove(index);
    Some(node.with_children(rebuilt))
}

/// A dotted name as written: `A.B.C`, `global::A.B`, `A.B<T>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedName {
    /// Written with the `global::` prefix
    pub global: bool,
    pub parts: Vec<String>,
}

impl DottedName {
    pub fn joined(&self) -> String {
        self.parts.join(".")
    }
}

/// Read a name or member-access chain. Type arguments are dropped.
///
/// `None` for anything that is not a plain name (calls, `this`, extern
/// aliases other than `global`, `->` access).
pub fn dotted_name(element: &SyntaxElement) -> Option<DottedName> {
    let mut name = DottedName {
        global: false,
        parts: Vec::new(),
    };
    collect_parts(element, &mut name)?;
    Some(name)
}

fn collect_parts(element: &SyntaxElement, name: &mut DottedName) -> Option<()> {
    match element.kind() {
        "identifier" => {
            name.parts.push(element.token_text());
            Some(())
        }
        "generic_name" => {
            let identifier = &element.as_node()?.children().first()?.element;
            name.parts.push(identifier.token_text());
            Some(())
        }
        "qualified_name" => {
            let node = element.as_node()?;
            collect_parts(node.child_by_field("qualifier")?, name)?;
            collect_parts(node.child_by_field("name")?, name)
        }
        "member_access_expression" => {
            let node = element.as_node()?;
            if !node.has_token(".") {
                return None;
            }
            collect_parts(node.child_by_field("expression")?, name)?;
            collect_parts(node.child_by_field("name")?, name)
        }
        "alias_qualified_name" => {
            let node = element.as_node()?;
            if !name.parts.is_empty() || node.child_by_field("alias")?.token_text() != "global" {
                return None;
            }
            name.global = true;
            collect_parts(node.child_by_field("name")?, name)
        }
        _ => None,
    }
}

/// The simple name being called or declared: last part of a dotted name.
pub fn simple_name(element: &SyntaxElement) -> Option<String> {
    match element.kind() {
        "identifier" => Some(element.token_text()),
        "generic_name" => Some(element.as_node()?.children().first()?.element.token_text()),
        "qualified_name" | "member_access_expression" | "alias_qualified_name" => {
            simple_name(element.as_node()?.child_by_field("name")?)
        }
        _ => None,
    }
}

/// What a `using` directive imports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsingKind {
    /// `using A.B;`
    Namespace,
    /// `using static A.B;`
    Static,
    /// `using X = A.B;`
    Alias(String),
}

/// A parsed `using` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDirective {
    pub kind: UsingKind,
    /// `global using ...`
    pub global: bool,
    pub name: DottedName,
}

/// Read a `using_directive` node.
pub fn using_directive(node: &SyntaxNode) -> Option<UsingDirective> {
    if node.kind() != "using_directive" || node.has_token("unsafe") {
        return None;
    }
    let target = node
        .children()
        .iter()
        .filter(|c| c.field.is_none())
        .filter_map(|c| match c.element.kind() {
            "identifier" | "qualified_name" | "alias_qualified_name" | "generic_name" => {
                Some(&c.element)
            }
            _ => None,
        })
        .last()?;
    let kind = if let Some(alias) = node.child_by_field("name") {
        UsingKind::Alias(alias.token_text())
    } else if node.has_token("static") {
        UsingKind::Static
    } else {
        UsingKind::Namespace
    };
    Some(UsingDirective {
        kind,
        global: node.has_token("global"),
        name: dotted_name(target)?,
    })
}

/// Attributes of an attribute list, as child indices into the list.
pub fn attributes(list: &SyntaxNode) -> Vec<usize> {
    list_items(list, "attribute")
}

/// Child indices of the attribute lists of a declaration.
pub fn attribute_lists(declaration: &SyntaxNode) -> Vec<usize> {
    list_items(declaration, "attribute_list")
}

/// The argument list of an attribute, if it has one.
pub fn attribute_arguments(attribute: &SyntaxNode) -> Option<&Arc<SyntaxNode>> {
    attribute.child_nodes_of_kind("attribute_argument_list").next()
}

/// Split an attribute argument into its optional `name =`/`name:` and its value.
pub fn attribute_argument(argument: &SyntaxNode) -> Option<(Option<String>, &SyntaxElement)> {
    match argument.children() {
        [value] => Some((None, &value.element)),
        [name, _, value] => Some((Some(name.element.token_text()), &value.element)),
        _ => None,
    }
}

/// True if the declaration carries the given modifier keyword.
pub fn has_modifier(declaration: &SyntaxNode, keyword: &str) -> bool {
    declaration
        .child_nodes_of_kind("modifier")
        .any(|m| m.token_text() == keyword)
}
