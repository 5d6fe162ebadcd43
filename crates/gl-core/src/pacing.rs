//! Timing rules for narration bubbles and the semantic splitter that keeps
//! each bubble short enough to read at a glance.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::PacingHint;

pub const MS_PER_WORD: u64 = 300;
pub const MIN_DISPLAY_MS: u64 = 2_000;
pub const MAX_DISPLAY_MS: u64 = 8_000;
pub const QUESTION_GAP_MS: u64 = 1_500;
pub const FAST_GAP_MS: u64 = 800;
pub const MEDIUM_GAP_MS: u64 = 1_200;
pub const SLOW_GAP_MS: u64 = 1_800;
pub const DEFAULT_SPLIT_LENGTH: usize = 100;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn display_ms(text: &str) -> u64 {
    (word_count(text) as u64 * MS_PER_WORD).clamp(MIN_DISPLAY_MS, MAX_DISPLAY_MS)
}

pub fn gap_ms(text: &str, hint: PacingHint) -> u64 {
    if text.trim_end().ends_with('?') {
        return QUESTION_GAP_MS;
    }
    match hint {
        PacingHint::Fast => FAST_GAP_MS,
        PacingHint::Slow => SLOW_GAP_MS,
        PacingHint::Normal => match text.chars().count() {
            0..=49 => FAST_GAP_MS,
            50..=119 => MEDIUM_GAP_MS,
            _ => SLOW_GAP_MS,
        },
    }
}

pub fn semantic_split<S: AsRef<str>>(messages: &[S], max_length: usize) -> Vec<String> {
    let mut fragments = Vec::new();
    for message in messages {
        split_message(message.as_ref(), max_length, &mut fragments);
    }
    fragments
}

fn split_message(text: &str, max_length: usize, fragments: &mut Vec<String>) {
    if char_len(text) <= max_length {
        fragments.push(text.to_string());
        return;
    }

    let paragraphs = paragraph_break()
        .split(text)
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .collect::<Vec<_>>();

    if paragraphs.len() > 1 {
        for paragraph in paragraphs {
            if char_len(paragraph) <= max_length {
                fragments.push(paragraph.to_string());
            } else {
                fragments.extend(group_sentences(paragraph, max_length));
            }
        }
        return;
    }

    fragments.extend(group_sentences(text, max_length));
}

/// Greedily packs whole sentences into fragments of at most `max_length`
/// characters. A single sentence longer than the limit stays whole.
fn group_sentences(text: &str, max_length: usize) -> Vec<String> {
    let spans = sentence_spans(text);
    if spans.len() <= 1 {
        return vec![text.to_string()];
    }

    let mut groups = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    for (start, end) in spans {
        current = match current {
            None => Some((start, end)),
            Some((group_start, group_end)) => {
                if char_len(text[group_start..end].trim()) <= max_length {
                    Some((group_start, end))
                } else {
                    groups.push(text[group_start..group_end].trim().to_string());
                    Some((start, end))
                }
            }
        };
    }
    if let Some((group_start, group_end)) = current {
        groups.push(text[group_start..group_end].trim().to_string());
    }
    groups
}

fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    for boundary in sentence_break().find_iter(text) {
        if !text[start..boundary.end()].trim().is_empty() {
            spans.push((start, boundary.end()));
        }
        start = boundary.end();
    }
    if start < text.len() && !text[start..].trim().is_empty() {
        spans.push((start, text.len()));
    }
    spans
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn paragraph_break() -> &'static Regex {
    static PARAGRAPH: OnceLock<Regex> = OnceLock::new();
    PARAGRAPH.get_or_init(|| Regex::new(r"\n[ \t]*\n\s*").expect("paragraph regex"))
}

fn sentence_break() -> &'static Regex {
    static SENTENCE: OnceLock<Regex> = OnceLock::new();
    SENTENCE.get_or_init(|| Regex::new(r#"[.!?]+["'”’)\]]*\s+"#).expect("sentence regex"))
}
