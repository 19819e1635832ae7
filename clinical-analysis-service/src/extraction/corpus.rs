use std::ops::Range;

use super::matcher::PhraseMatcher;
use crate::stages::StageId;

pub const STAGE_SEPARATOR: &str = "\n\n=== NEXT STAGE ===\n\n";

/// Characters kept before and after a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub before: usize,
    pub after: usize,
}

impl Window {
    pub const fn new(before: usize, after: usize) -> Self {
        Self { before, after }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSizes {
    pub symptom: Window,
    pub condition: Window,
    pub intervention: Window,
    pub concern: Window,
    /// Half-width of the excerpt quoted as diagnostic reasoning
    pub reasoning_excerpt: usize,
}

impl Default for WindowSizes {
    fn default() -> Self {
        Self {
            symptom: Window::new(100, 200),
            condition: Window::new(150, 300),
            intervention: Window::new(100, 200),
            concern: Window::new(100, 200),
            reasoning_excerpt: 500,
        }
    }
}

#[derive(Debug, Clone)]
struct Section {
    stage: StageId,
    span: Range<usize>,
}

/// Narrative of all completed stages joined into one searchable text.
///
/// Matching runs against an ASCII-lowercased copy with identical byte offsets, so any range
/// found there can be cut from the original text as well.
#[derive(Debug, Clone)]
pub struct Corpus {
    text: String,
    lower: String,
    sections: Vec<Section>,
}

impl Corpus {
    pub fn from_stages<'a>(stages: impl IntoIterator<Item = (StageId, &'a str)>) -> Self {
        let mut text = String::new();
        let mut sections = Vec::new();

        for (i, (stage, narrative)) in stages.into_iter().enumerate() {
            if i > 0 {
                text.push_str(STAGE_SEPARATOR);
            }
            let start = text.len();
            text.push_str(narrative);
            sections.push(Section {
                stage,
                span: start..text.len(),
            });
        }

        let lower = text.to_ascii_lowercase();
        Self {
            text,
            lower,
            sections,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn is_blank(&self) -> bool {
        self.sections
            .iter()
            .all(|s| self.text[s.span.clone()].trim().is_empty())
    }

    /// Lowercased narrative of one stage.
    pub fn stage_text(&self, stage: StageId) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| &self.lower[s.span.clone()])
    }

    /// Stage whose narrative contains byte `offset`.
    pub fn stage_at(&self, offset: usize) -> Option<StageId> {
        self.sections
            .iter()
            .find(|s| s.span.contains(&offset))
            .map(|s| s.stage)
    }

    pub fn find(&self, matcher: &dyn PhraseMatcher, phrase: &str) -> Option<Range<usize>> {
        matcher.find(&self.lower, phrase)
    }

    /// Earliest mention of any of `phrases` in the corpus.
    pub fn find_any<'p>(
        &self,
        matcher: &dyn PhraseMatcher,
        phrases: &'p [String],
    ) -> Option<(&'p str, Range<usize>)> {
        matcher.find_any(&self.lower, phrases)
    }

    /// Lowercased text around a match: `before` bytes ahead of its start, `after` bytes past it.
    pub fn window(&self, at: &Range<usize>, window: Window) -> &str {
        let span = self.span_around(at.start, window.before, window.after);
        &self.lower[span]
    }

    /// Original-case excerpt of `radius` bytes each side of `offset`.
    pub fn excerpt(&self, offset: usize, radius: usize) -> &str {
        let span = self.span_around(offset, radius, radius);
        &self.text[span]
    }

    fn span_around(&self, offset: usize, before: usize, after: usize) -> Range<usize> {
        let start = floor_boundary(&self.text, offset.saturating_sub(before));
        let end = ceil_boundary(&self.text, offset.saturating_add(after).min(self.text.len()));
        start..end
    }
}

fn floor_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
