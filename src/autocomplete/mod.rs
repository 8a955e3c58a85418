use tracing::debug;

use crate::service::{ServiceError, SuggestContext, SuggestKind, SuggestionSource};

/// Incremental lookup for one input field.
///
/// Every keystroke starts a new generation; results are only kept when they
/// belong to the latest one, so a slow response for an older keyword cannot
/// overwrite the list for the current keyword.
pub struct Autocomplete<S> {
    source: S,
    kind: SuggestKind,
    generation: u64,
    suggestions: Vec<String>,
}

impl<S> Autocomplete<S> {
    pub fn new(source: S, kind: SuggestKind) -> Self {
        Self {
            source,
            kind,
            generation: 0,
            suggestions: Vec::new(),
        }
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Starts a lookup for `keyword`. An empty keyword clears the list and
    /// needs no request.
    pub fn begin(&mut self, keyword: &str) -> Option<u64> {
        self.generation = self.generation.wrapping_add(1);
        if keyword.trim().is_empty() {
            self.suggestions.clear();
            return None;
        }
        Some(self.generation)
    }

    /// Stores `results` if `generation` is still current. Returns whether they
    /// were applied.
    pub fn apply(&mut self, generation: u64, results: Vec<String>) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "dropping stale suggestions");
            return false;
        }
        let mut seen = std::collections::HashSet::new();
        self.suggestions = results
            .into_iter()
            .filter(|s| !s.trim().is_empty() && seen.insert(s.clone()))
            .collect();
        true
    }

    /// Picking a suggestion closes the list.
    pub fn select(&mut self, index: usize) -> Option<String> {
        let picked = self.suggestions.get(index).cloned();
        if picked.is_some() {
            self.generation = self.generation.wrapping_add(1);
            self.suggestions.clear();
        }
        picked
    }
}

impl<S: SuggestionSource> Autocomplete<S> {
    pub async fn lookup(
        &mut self,
        keyword: &str,
        context: &SuggestContext,
    ) -> Result<&[String], ServiceError> {
        let Some(generation) = self.begin(keyword) else {
            return Ok(&self.suggestions);
        };
        let results = self
            .source
            .suggest(self.kind, keyword.trim(), context)
            .await?;
        self.apply(generation, results);
        Ok(&self.suggestions)
    }
}
