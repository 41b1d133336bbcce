use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};

/// Font sizes offered by the editor, in points.
pub const FONT_SIZES: [u16; 12] = [12, 14, 16, 18, 20, 22, 24, 28, 32, 36, 42, 48];

const BULLET: &str = "• ";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    System,
    TimesNewRoman,
    Helvetica,
    Courier,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TextStyle {
    Bold,
    Italic,
    Underline,
    Font(FontFamily),
    Size(u16),
}

impl TextStyle {
    /// Font and size are exclusive attributes: a range carries at most one of each.
    fn same_slot(&self, other: &TextStyle) -> bool {
        match (self, other) {
            (TextStyle::Font(_), TextStyle::Font(_)) => true,
            (TextStyle::Size(_), TextStyle::Size(_)) => true,
            _ => self == other,
        }
    }
}

/// A style applied to the byte range `start..end` of the document text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StyleSpan {
    pub start: usize,
    pub end: usize,
    pub style: TextStyle,
}

impl StyleSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Structured journal body: plain text plus a list of style spans.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RichText {
    text: String,
    #[serde(default)]
    spans: Vec<StyleSpan>,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[StyleSpan] {
        &self.spans
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// First `max_chars` characters of the text.
    pub fn preview(&self, max_chars: usize) -> String {
        self.text.chars().take(max_chars).collect()
    }

    /// Title derived from the first non-blank line, used when the author leaves the title empty.
    pub fn smart_title(&self) -> String {
        self.text
            .lines()
            .find(|line| !line.trim().is_empty())
            .map(|line| line.chars().take(40).collect())
            .unwrap_or_else(|| "Journal Entry".to_string())
    }

    pub fn apply(&mut self, range: Range<usize>, style: TextStyle) -> Result<()> {
        self.validate(&range)?;
        if let TextStyle::Size(size) = style {
            if !FONT_SIZES.contains(&size) {
                return Err(JournalError::InvalidFontSize(size));
            }
        }
        if range.is_empty() {
            return Ok(());
        }
        self.clear_where(&range, |existing| existing.same_slot(&style));
        self.spans.push(StyleSpan {
            start: range.start,
            end: range.end,
            style,
        });
        self.normalize();
        Ok(())
    }

    pub fn remove(&mut self, range: Range<usize>, style: TextStyle) -> Result<()> {
        self.validate(&range)?;
        if range.is_empty() {
            return Ok(());
        }
        self.clear_where(&range, |existing| *existing == style);
        self.normalize();
        Ok(())
    }

    /// Removes `style` when the whole range already carries it, applies it otherwise.
    pub fn toggle(&mut self, range: Range<usize>, style: TextStyle) -> Result<()> {
        self.validate(&range)?;
        if self.is_active(range.clone(), style) {
            self.remove(range, style)
        } else {
            self.apply(range, style)
        }
    }

    /// An empty range reports the style of the character before the cursor.
    pub fn is_active(&self, range: Range<usize>, style: TextStyle) -> bool {
        if range.is_empty() {
            let at = range.start;
            return self
                .spans
                .iter()
                .any(|span| span.style == style && span.start < at && at <= span.end);
        }
        self.spans
            .iter()
            .any(|span| span.style == style && span.start <= range.start && range.end <= span.end)
    }

    /// Prefixes each line touched by `range` with `• `, keeping spans on their text.
    /// Returns the range now covering the bulleted lines. Empty ranges change nothing.
    pub fn insert_bullets(&mut self, range: Range<usize>) -> Result<Range<usize>> {
        self.validate(&range)?;
        if range.is_empty() {
            return Ok(range);
        }
        let mut starts = vec![range.start];
        starts.extend(
            self.text[range.clone()]
                .match_indices('\n')
                .map(|(at, _)| range.start + at + 1),
        );

        let mut text = String::with_capacity(self.text.len() + starts.len() * BULLET.len());
        let mut last = 0;
        for &start in &starts {
            text.push_str(&self.text[last..start]);
            text.push_str(BULLET);
            last = start;
        }
        text.push_str(&self.text[last..]);

        let shift = |pos: usize, inclusive: bool| {
            let before = starts
                .iter()
                .filter(|&&start| if inclusive { start <= pos } else { start < pos })
                .count();
            pos + before * BULLET.len()
        };
        for span in &mut self.spans {
            span.start = shift(span.start, true);
            span.end = shift(span.end, false);
        }
        self.text = text;
        Ok(range.start..range.end + starts.len() * BULLET.len())
    }

    fn validate(&self, range: &Range<usize>) -> Result<()> {
        let len = self.text.len();
        let ok = range.start <= range.end
            && range.end <= len
            && self.text.is_char_boundary(range.start)
            && self.text.is_char_boundary(range.end);
        if ok {
            Ok(())
        } else {
            Err(JournalError::InvalidSpan {
                start: range.start,
                end: range.end,
                len,
            })
        }
    }

    fn clear_where(&mut self, range: &Range<usize>, matches: impl Fn(&TextStyle) -> bool) {
        let mut kept = Vec::with_capacity(self.spans.len() + 1);
        for span in self.spans.drain(..) {
            let overlaps = span.start < range.end && range.start < span.end;
            if !overlaps || !matches(&span.style) {
                kept.push(span);
                continue;
            }
            if span.start < range.start {
                kept.push(StyleSpan {
                    end: range.start,
                    ..span
                });
            }
            if range.end < span.end {
                kept.push(StyleSpan {
                    start: range.end,
                    ..span
                });
            }
        }
        self.spans = kept;
    }

    /// Sorts spans and merges touching spans of the same style.
    fn normalize(&mut self) {
        self.spans.retain(|span| span.start < span.end);
        self.spans.sort_by_key(|span| (span.start, span.end, span.style));
        let mut merged: Vec<StyleSpan> = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            if let Some(previous) = merged
                .iter_mut()
                .rev()
                .find(|candidate| candidate.style == span.style)
            {
                if span.start <= previous.end {
                    previous.end = previous.end.max(span.end);
                    continue;
                }
            }
            merged.push(span);
        }
        merged.sort_by_key(|span| (span.start, span.end));
        self.spans = merged;
    }
}
