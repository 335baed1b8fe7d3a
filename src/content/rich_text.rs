use crate::decision::token::DecisionToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
}

impl TextStyle {
    pub const PLAIN: Self = Self {
        bold: false,
        italic: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
    pub mime_type: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Embed {
    Decision(DecisionToken),
    Media(MediaRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    Text { text: String, style: TextStyle },
    Embed(Embed),
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Run::Text {
            text: text.into(),
            style: TextStyle::PLAIN,
        }
    }

    pub fn decision(token: DecisionToken) -> Self {
        Run::Embed(Embed::Decision(token))
    }

    /// Logical width: one unit per char of text, one unit per embed.
    pub fn width(&self) -> usize {
        match self {
            Run::Text { text, .. } => text.chars().count(),
            Run::Embed(_) => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("offset {offset} is past the end of the document (length {len})")]
    OutOfBounds { offset: usize, len: usize },
    #[error("no embed at offset {0}")]
    NotAnEmbed(usize),
    #[error("expected `{expected}` before offset {offset}")]
    MissingTrigger { expected: char, offset: usize },
}

/// An ordered run sequence. Adjacent text runs of the same style are kept
/// merged; embeds are atomic and always occupy exactly one unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RichText {
    runs: Vec<Run>,
}

impl RichText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_runs(runs: Vec<Run>) -> Self {
        let mut doc = Self { runs };
        doc.normalize();
        doc
    }

    pub fn plain(text: &str) -> Self {
        Self::from_runs(vec![Run::plain(text)])
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.iter().map(Run::width).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visible text with embeds rendered as `[label]`.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            match run {
                Run::Text { text, .. } => out.push_str(text),
                Run::Embed(Embed::Decision(token)) => {
                    out.push('[');
                    out.push_str(&token.render_label());
                    out.push(']');
                }
                Run::Embed(Embed::Media(media)) => {
                    out.push_str(&format!("[{}]", media.name));
                }
            }
        }
        out
    }

    pub fn decisions(&self) -> impl Iterator<Item = (usize, &DecisionToken)> {
        let mut offset = 0;
        self.runs.iter().filter_map(move |run| {
            let start = offset;
            offset += run.width();
            match run {
                Run::Embed(Embed::Decision(token)) => Some((start, token)),
                _ => None,
            }
        })
    }

    /// The char immediately before `offset`, or `None` at the start of the
    /// document or when an embed sits there.
    pub fn char_before(&self, offset: usize) -> Option<char> {
        if offset == 0 || offset > self.len() {
            return None;
        }
        let target = offset - 1;
        let mut start = 0;
        for run in &self.runs {
            let width = run.width();
            if target < start + width {
                return match run {
                    Run::Text { text, .. } => text.chars().nth(target - start),
                    Run::Embed(_) => None,
                };
            }
            start += width;
        }
        None
    }

    pub fn embed_at(&self, offset: usize) -> Option<&Embed> {
        let mut start = 0;
        for run in &self.runs {
            let width = run.width();
            if offset < start + width {
                return match run {
                    Run::Embed(embed) if start == offset => Some(embed),
                    _ => None,
                };
            }
            start += width;
        }
        None
    }

    pub fn insert_text(
        &mut self,
        offset: usize,
        text: &str,
        style: TextStyle,
    ) -> Result<(), EditError> {
        if text.is_empty() {
            return self.check_offset(offset);
        }
        self.insert_run(
            offset,
            Run::Text {
                text: text.to_string(),
                style,
            },
        )
    }

    pub fn insert_embed(&mut self, offset: usize, embed: Embed) -> Result<(), EditError> {
        self.insert_run(offset, Run::Embed(embed))
    }

    /// Removes `len` units starting at `offset`. Embeds inside the range go
    /// whole; there is no partial embed.
    pub fn delete(&mut self, offset: usize, len: usize) -> Result<(), EditError> {
        let end = offset + len;
        if end > self.len() {
            return Err(EditError::OutOfBounds {
                offset: end,
                len: self.len(),
            });
        }
        if len == 0 {
            return Ok(());
        }
        let idx = self.split_at(offset);
        let end_idx = self.split_at(end);
        self.runs.drain(idx..end_idx);
        self.normalize();
        Ok(())
    }

    pub fn replace_embed(&mut self, offset: usize, embed: Embed) -> Result<(), EditError> {
        if self.embed_at(offset).is_none() {
            return Err(EditError::NotAnEmbed(offset));
        }
        let mut start = 0;
        for run in &mut self.runs {
            if start == offset {
                if let Run::Embed(existing) = run {
                    *existing = embed;
                    return Ok(());
                }
            }
            start += run.width();
        }
        Err(EditError::NotAnEmbed(offset))
    }

    fn check_offset(&self, offset: usize) -> Result<(), EditError> {
        let len = self.len();
        if offset > len {
            return Err(EditError::OutOfBounds { offset, len });
        }
        Ok(())
    }

    fn insert_run(&mut self, offset: usize, run: Run) -> Result<(), EditError> {
        self.check_offset(offset)?;
        let idx = self.split_at(offset);
        self.runs.insert(idx, run);
        self.normalize();
        Ok(())
    }

    /// Splits a text run so a run boundary falls at `offset` and returns the
    /// index of the first run starting at or after it.
    fn split_at(&mut self, offset: usize) -> usize {
        let mut start = 0;
        for idx in 0..self.runs.len() {
            if start == offset {
                return idx;
            }
            let width = self.runs[idx].width();
            if offset < start + width {
                if let Run::Text { text, style } = &self.runs[idx] {
                    let split = text
                        .char_indices()
                        .nth(offset - start)
                        .map(|(byte, _)| byte)
                        .unwrap_or(text.len());
                    let head = Run::Text {
                        text: text[..split].to_string(),
                        style: *style,
                    };
                    let tail = Run::Text {
                        text: text[split..].to_string(),
                        style: *style,
                    };
                    self.runs[idx] = head;
                    self.runs.insert(idx + 1, tail);
                    return idx + 1;
                }
                return idx + 1;
            }
            start += width;
        }
        self.runs.len()
    }

    fn normalize(&mut self) {
        let mut merged: Vec<Run> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if let Run::Text { text, style } = &run {
                if text.is_empty() {
                    continue;
                }
                if let Some(Run::Text {
                    text: prev,
                    style: prev_style,
                }) = merged.last_mut()
                {
                    if prev_style == style {
                        prev.push_str(text);
                        continue;
                    }
                }
            }
            merged.push(run);
        }
        self.runs = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::token::DecisionKind;

    fn tag(id: i64, label: &str) -> Embed {
        Embed::Decision(DecisionToken::new(DecisionKind::AddTag, Some(id), label).expect("token"))
    }

    #[test]
    fn embeds_count_as_one_unit() {
        let mut doc = RichText::plain("Olá ");
        doc.insert_embed(4, tag(1, "VIP")).expect("insert");
        doc.insert_text(5, " fim", TextStyle::PLAIN).expect("insert");
        assert_eq!(doc.len(), 9);
        assert!(doc.embed_at(4).is_some());
        assert_eq!(doc.char_before(4), Some(' '));
        assert_eq!(doc.char_before(5), None);
    }

    #[test]
    fn insert_splits_text_runs_on_char_boundaries() {
        let mut doc = RichText::plain("ação");
        doc.insert_embed(2, tag(1, "x")).expect("insert");
        assert_eq!(doc.runs().len(), 3);
        assert_eq!(doc.runs()[0], Run::plain("aç"));
        assert_eq!(doc.runs()[2], Run::plain("ão"));
    }

    #[test]
    fn delete_removes_whole_embeds_and_merges_text() {
        let mut doc = RichText::plain("ab");
        doc.insert_embed(1, tag(1, "x")).expect("insert");
        doc.delete(1, 1).expect("delete");
        assert_eq!(doc.runs(), &[Run::plain("ab")]);
    }

    #[test]
    fn replace_embed_requires_an_embed_at_offset() {
        let mut doc = RichText::plain("ab");
        assert_eq!(doc.replace_embed(0, tag(2, "y")), Err(EditError::NotAnEmbed(0)));
        doc.insert_embed(2, tag(1, "x")).expect("insert");
        doc.replace_embed(2, tag(2, "y")).expect("replace");
        assert_eq!(doc.embed_at(2), Some(&tag(2, "y")));
    }

    #[test]
    fn out_of_bounds_edits_are_rejected() {
        let mut doc = RichText::plain("ab");
        assert_eq!(
            doc.insert_text(3, "c", TextStyle::PLAIN),
            Err(EditError::OutOfBounds { offset: 3, len: 2 })
        );
    }
}
