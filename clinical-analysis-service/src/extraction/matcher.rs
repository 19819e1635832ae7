use std::fmt::Debug;
use std::ops::Range;

/// Strategy for locating a phrase inside narrative text.
///
/// Both arguments arrive lowercased. Implementations return the byte range of the first
/// match so callers can cut context windows around it.
pub trait PhraseMatcher: Send + Sync + Debug {
    fn find(&self, haystack: &str, phrase: &str) -> Option<Range<usize>>;

    fn contains(&self, haystack: &str, phrase: &str) -> bool {
        self.find(haystack, phrase).is_some()
    }

    /// Earliest occurrence of any phrase in `phrases`, with where it matched. Phrases
    /// matching at the same offset resolve to the one listed first.
    fn find_any<'p>(&self, haystack: &str, phrases: &'p [String]) -> Option<(&'p str, Range<usize>)> {
        phrases
            .iter()
            .filter_map(|p| self.find(haystack, p).map(|at| (p.as_str(), at)))
            .min_by_key(|(_, at)| at.start)
    }
}

/// Plain substring matching
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralMatcher;

impl PhraseMatcher for LiteralMatcher {
    fn find(&self, haystack: &str, phrase: &str) -> Option<Range<usize>> {
        if phrase.is_empty() {
            return None;
        }
        haystack.find(phrase).map(|start| start..start + phrase.len())
    }
}
