//! Splits tagged reasoning (`<think>...</think>`) out of streamed text.
//!
//! Tags may be cut anywhere by the upstream tokenizer, so a possible partial
//! tag at the end of the buffer is held back until the next delta decides it.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Reasoning(String),
}

#[derive(Debug)]
pub struct TagExtractor {
    open: String,
    close: String,
    inside: bool,
    pending: String,
}

impl TagExtractor {
    pub fn new(tag: &str) -> Self {
        Self {
            open: format!("<{tag}>"),
            close: format!("</{tag}>"),
            inside: false,
            pending: String::new(),
        }
    }

    pub fn push(&mut self, delta: &str) -> Vec<Segment> {
        self.pending.push_str(delta);

        let mut out = Vec::new();
        loop {
            let tag = if self.inside {
                self.close.clone()
            } else {
                self.open.clone()
            };

            if let Some(idx) = self.pending.find(&tag) {
                let before: String = self.pending.drain(..idx).collect();
                self.emit(&mut out, before);
                self.pending.drain(..tag.len());
                self.inside = !self.inside;
                continue;
            }

            let keep = partial_suffix_len(&self.pending, &tag);
            let ready: String = self.pending.drain(..self.pending.len() - keep).collect();
            self.emit(&mut out, ready);
            break;
        }
        out
    }

    /// Releases whatever is still held back, e.g. an unterminated `<thi`.
    pub fn flush(&mut self) -> Vec<Segment> {
        let mut out = Vec::new();
        let rest = std::mem::take(&mut self.pending);
        self.emit(&mut out, rest);
        out
    }

    fn emit(&self, out: &mut Vec<Segment>, text: String) {
        if text.is_empty() {
            return;
        }
        out.push(if self.inside {
            Segment::Reasoning(text)
        } else {
            Segment::Text(text)
        });
    }
}

/// Length of the longest suffix of `haystack` that is a proper prefix of `tag`.
fn partial_suffix_len(haystack: &str, tag: &str) -> usize {
    let max = tag.len().saturating_sub(1).min(haystack.len());
    (1..=max)
        .rev()
        .find(|&k| {
            let start = haystack.len() - k;
            haystack.is_char_boundary(start) && tag.starts_with(&haystack[start..])
        })
        .unwrap_or(0)
}
