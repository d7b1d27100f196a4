//! C# parser using tree-sitter

use anyhow::{Context, Result};
use tree_sitter::{Language, Parser, Tree};

/// Parser for C# source files using tree-sitter
pub struct CSharpParser {
    parser: Parser,
}

impl CSharpParser {
    /// Create a new C# parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&Self::language())
            .context("Failed to set C# language")?;
        Ok(Self { parser })
    }

    /// Parse source code into a syntax tree
    pub fn parse(&mut self, source: &str) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .context("Failed to parse C# source")
    }

    /// Get the tree-sitter language for C#
    pub fn language() -> Language {
        tree_sitter_c_sharp::LANGUAGE.into()
    }
}

impl std::fmt::Debug for CSharpParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CSharpParser").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let mut parser = CSharpParser::new().unwrap();
        let tree = parser.parse("using Xunit;").unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn test_parse_test_class() {
        let mut parser = CSharpParser::new().unwrap();
        let source = r#"
            [TestClass]
            public class CalculatorTests
            {
                [TestMethod]
                public void Adds()
                {
                    Assert.AreEqual(2, 1 + 1, "math");
                }
            }
        "#;
        let tree = parser.parse(source).unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn test_parse_reports_errors() {
        let mut parser = CSharpParser::new().unwrap();
        let tree = parser.parse("class { void (").unwrap();
        assert!(tree.root_node().has_error());
    }
}
