//! Pass pipeline - runs every enabled pass in order

use crate::config::EffectiveConfig;
use crate::document::Document;
use crate::passes::{
    self, AssertionPass, AttributePass, ExpectedExceptionPass, Pass, RenamePass, UsingPass,
};
use crate::rules::RuleSet;
use crate::{Diagnostic, PassId};
use std::sync::Arc;

/// Result of converting one document
#[derive(Debug, Clone)]
pub struct Conversion {
    pub document: Document,
    /// Diagnostics of every pass, in pass order
    pub diagnostics: Vec<Diagnostic>,
    /// Whether any pass changed the tree
    pub changed: bool,
}

impl Conversion {
    pub fn text(&self) -> &str {
        self.document.text()
    }
}

/// Composes the passes in their fixed order
pub struct Converter {
    passes: Vec<Box<dyn Pass>>,
}

impl Converter {
    /// Every pass, built from `rules`.
    pub fn new(rules: &RuleSet) -> Self {
        Self::with_passes(rules, |_| true)
    }

    /// Passes enabled by a configuration. Ignored files get no passes.
    pub fn from_config(config: &EffectiveConfig) -> Self {
        if config.ignored {
            return Self { passes: Vec::new() };
        }
        Self::with_passes(&config.rule_set(), |id| config.is_enabled(id))
    }

    fn with_passes(rules: &RuleSet, enabled: impl Fn(PassId) -> bool) -> Self {
        let passes = PassId::ALL
            .into_iter()
            .filter(|&id| enabled(id))
            .map(|id| build_pass(id, rules))
            .collect();
        Self { passes }
    }

    /// Ids of the passes this converter runs, in order
    pub fn pass_ids(&self) -> Vec<PassId> {
        self.passes.iter().map(|p| p.id()).collect()
    }

    /// Run every pass, each on the previous pass's output.
    pub fn convert(&self, document: &Document) -> Conversion {
        let mut current = document.clone();
        let mut diagnostics = Vec::new();
        let mut changed = false;
        for pass in &self.passes {
            let result = passes::apply(pass.as_ref(), &current);
            changed |= result.changed;
            diagnostics.extend(result.diagnostics);
            current = result.document;
        }
        tracing::debug!(
            path = %document.path().display(),
            changed,
            diagnostics = diagnostics.len(),
            "converted document"
        );
        Conversion {
            document: current,
            diagnostics,
            changed,
        }
    }

    /// Convert many documents in parallel using rayon
    pub fn convert_all(&self, documents: &[Document]) -> Vec<Conversion> {
        use rayon::prelude::*;

        documents.par_iter().map(|d| self.convert(d)).collect()
    }
}

fn build_pass(id: PassId, rules: &RuleSet) -> Box<dyn Pass> {
    match id {
        PassId::ExpectedException => Box::new(ExpectedExceptionPass::new(
            Arc::clone(&rules.attributes),
            Arc::clone(&rules.exceptions),
        )),
        PassId::Assertions => Box::new(AssertionPass::new(
            Arc::clone(&rules.assertions),
            Arc::clone(&rules.assert_target),
        )),
        PassId::AssertRename => Box::new(RenamePass::new(
            Arc::clone(&rules.renames),
            Arc::clone(&rules.assert_target),
        )),
        PassId::TestAttributes => Box::new(AttributePass::new(Arc::clone(&rules.attributes))),
        PassId::Usings => Box::new(UsingPass::new(Arc::clone(&rules.imports))),
    }
}
