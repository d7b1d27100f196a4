//! Hard errors. Only the edges of the crate fail: loading the grammar and
//! parsing. Rewrites never fail, they report diagnostics instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to load the C# grammar: {0}")]
    Grammar(#[source] anyhow::Error),

    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("unknown pass `{0}`")]
    UnknownPass(String),
}
