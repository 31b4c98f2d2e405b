use std::collections::HashMap;

use crate::parsing::footnotes::FootnoteIds;
use crate::shelf::Shelves;

/// Mutable state for exactly one render call. A fresh context is built per
/// call and dropped at the end, so concurrent renders never share it.
#[derive(Debug, Default)]
pub struct ParseContext {
    pub shelves: Shelves,
    pub footnotes: FootnoteIds,
    /// `[name]url` definitions collected from the document.
    pub url_refs: HashMap<String, String>,
    /// Current span recursion depth.
    pub span_depth: usize,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }
}
