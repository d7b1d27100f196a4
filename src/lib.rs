//! Unitport: MSTest to xUnit source migration
//!
//! This library rewrites C# test files written against MSTest into equivalent
//! xUnit code. Every rewrite is a small, conservative tree pass: call sites are
//! matched by resolved identity against immutable rule tables, anything that
//! does not match exactly is left alone, and comments and formatting outside
//! the edited spans come through byte for byte.

pub mod config;
pub mod converter;
pub mod document;
pub mod error;
pub mod parser;
pub mod passes;
pub mod resolve;
pub mod rules;
pub mod syntax;
pub mod workspace;

pub use converter::{Conversion, Converter};
pub use document::Document;
pub use error::ConvertError;
pub use passes::{Pass, PassResult};
pub use rules::RuleSet;
pub use workspace::Workspace;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A non-fatal problem found while rewriting a recognized construct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Pass that reported it
    pub pass: PassId,
    /// Human-readable message
    pub message: String,
    /// Location in the pass's input text
    pub location: Location,
    /// Name of the declaration left untouched (when applicable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<String>,
}

/// Location in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in characters)
    pub column: usize,
    /// End line (optional)
    pub end_line: Option<usize>,
    /// End column (optional)
    pub end_column: Option<usize>,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            end_line: None,
            end_column: None,
        }
    }

    pub fn with_end(mut self, end_line: usize, end_column: usize) -> Self {
        self.end_line = Some(end_line);
        self.end_column = Some(end_column);
        self
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Rewrite passes, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassId {
    ExpectedException,
    /// Message demotion and type-check reshaping
    Assertions,
    AssertRename,
    TestAttributes,
    Usings,
}

impl PassId {
    pub const ALL: [PassId; 5] = [
        PassId::ExpectedException,
        PassId::Assertions,
        PassId::AssertRename,
        PassId::TestAttributes,
        PassId::Usings,
    ];
}

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassId::Assertions => write!(f, "assertions"),
            PassId::AssertRename => write!(f, "assert-rename"),
            PassId::ExpectedException => write!(f, "expected-exception"),
            PassId::TestAttributes => write!(f, "test-attributes"),
            PassId::Usings => write!(f, "usings"),
        }
    }
}

impl std::str::FromStr for PassId {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PassId::ALL
            .into_iter()
            .find(|id| id.to_string() == s)
            .ok_or_else(|| ConvertError::UnknownPass(s.to_string()))
    }
}

/// Convert one source file with the built-in rules.
///
/// Parsing is the only thing that can fail; every rewrite problem is reported
/// as a diagnostic on the returned conversion.
pub fn convert_source(path: &Path, source: &str) -> Result<Conversion, ConvertError> {
    let rules = RuleSet::mstest_to_xunit();
    let mut workspace = Workspace::new(&rules)?;
    let document = workspace.open(path, source)?;
    Ok(Converter::new(&rules).convert(&document))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_ids_round_trip_through_kebab_case() {
        for id in PassId::ALL {
            let parsed: PassId = id.to_string().parse().unwrap();
            assert_eq!(parsed, id);
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{id}\""));
        }
        assert!("rename".parse::<PassId>().is_err());
    }

    #[test]
    fn diagnostics_serialize_in_camel_case() {
        let diagnostic = Diagnostic {
            pass: PassId::ExpectedException,
            message: "no typeof".to_string(),
            location: Location::new(3, 5).with_end(3, 40),
            declaration: Some("Throws".to_string()),
        };
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["pass"], "expected-exception");
        assert_eq!(json["location"]["endColumn"], 40);
        assert_eq!(json["declaration"], "Throws");
    }

    #[test]
    fn convert_source_runs_the_pipeline() {
        let conversion = convert_source(
            Path::new("Tests.cs"),
            "using Microsoft.VisualStudio.TestTools.UnitTesting;\n",
        )
        .unwrap();
        assert!(conversion.changed);
        assert_eq!(conversion.document.text(), "using Xunit;\n");
    }
}
