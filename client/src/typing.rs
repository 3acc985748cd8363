//! Typing diff and the one-shot incantation submission.

use log::debug;
use shared::ClientMessage;
use std::time::{Duration, Instant};

/// Classification of one target character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Part of a word the cursor has already moved past.
    Completed,
    Correct,
    Incorrect,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Word,
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub chars: Vec<(char, CharClass)>,
}

impl Segment {
    pub fn text(&self) -> String {
        self.chars.iter().map(|(c, _)| c).collect()
    }
}

/// Compares `typed` against `target` position by position and groups the
/// result into words and whitespace runs of the target.
pub fn diff(target: &str, typed: &str) -> Vec<Segment> {
    let typed: Vec<char> = typed.chars().collect();
    let cursor = typed.len();

    let mut segments: Vec<Segment> = Vec::new();
    let mut start = 0;
    let mut current: Vec<char> = Vec::new();
    let mut current_kind = None;

    let flush = |kind: SegmentKind, chars: &[char], start: usize, segments: &mut Vec<Segment>| {
        let end = start + chars.len();
        let marks = chars
            .iter()
            .enumerate()
            .map(|(offset, &c)| {
                let index = start + offset;
                let class = match kind {
                    SegmentKind::Whitespace if index < cursor => CharClass::Completed,
                    SegmentKind::Whitespace => CharClass::Pending,
                    SegmentKind::Word if cursor >= end => CharClass::Completed,
                    SegmentKind::Word if index < cursor => {
                        if typed[index] == c {
                            CharClass::Correct
                        } else {
                            CharClass::Incorrect
                        }
                    }
                    SegmentKind::Word => CharClass::Pending,
                };
                (c, class)
            })
            .collect();
        segments.push(Segment { kind, chars: marks });
    };

    for c in target.chars() {
        let kind = if c.is_whitespace() {
            SegmentKind::Whitespace
        } else {
            SegmentKind::Word
        };
        if let Some(prev) = current_kind {
            if prev != kind {
                flush(prev, &current, start, &mut segments);
                start += current.len();
                current.clear();
            }
        }
        current_kind = Some(kind);
        current.push(c);
    }
    if let Some(kind) = current_kind {
        flush(kind, &current, start, &mut segments);
    }

    segments
}

/// Flattened per-character view of [`diff`].
pub fn classes(target: &str, typed: &str) -> Vec<CharClass> {
    diff(target, typed)
        .into_iter()
        .flat_map(|s| s.chars.into_iter().map(|(_, class)| class))
        .collect()
}

pub fn is_complete(target: &str, typed: &str) -> bool {
    typed.chars().count() >= target.chars().count()
}

/// Percentage of typed characters that match the target at the same position.
pub fn accuracy(target: &str, typed: &str) -> f64 {
    let typed_len = typed.chars().count();
    if typed_len == 0 {
        return 0.0;
    }
    let correct = target
        .chars()
        .zip(typed.chars())
        .filter(|(a, b)| a == b)
        .count();
    correct as f64 * 100.0 / typed_len as f64
}

/// Typing state for one typing phase.
///
/// The `submitted` flag is the one-shot guard: manual submit, auto-complete and
/// countdown expiry all go through [`TypingSession::submit`], first caller wins.
#[derive(Debug, Clone)]
pub struct TypingSession {
    target: String,
    typed: String,
    started_at: Option<Instant>,
    submitted: bool,
    auto_submit_at: Option<Instant>,
    auto_submit_delay: Duration,
}

impl TypingSession {
    pub fn new(auto_submit_delay: Duration) -> Self {
        Self {
            target: String::new(),
            typed: String::new(),
            started_at: None,
            submitted: false,
            auto_submit_at: None,
            auto_submit_delay,
        }
    }

    /// Begins a new challenge. Clears typed text but not the submission guard,
    /// which is only reset when a new turn starts.
    pub fn begin(&mut self, target: &str, now: Instant) {
        self.target = target.to_string();
        self.typed.clear();
        self.started_at = Some(now);
        self.auto_submit_at = None;
    }

    /// Called when the typing phase ends.
    pub fn end(&mut self) {
        self.started_at = None;
        self.auto_submit_at = None;
    }

    /// Clears everything including the submission guard.
    pub fn reset(&mut self) {
        self.end();
        self.target.clear();
        self.typed.clear();
        self.submitted = false;
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn segments(&self) -> Vec<Segment> {
        diff(&self.target, &self.typed)
    }

    /// Replaces the typed text. Schedules the automatic submission once the
    /// typed text is as long as the target.
    pub fn input(&mut self, text: &str, now: Instant) {
        if self.submitted || !self.is_active() {
            return;
        }
        self.typed = text.to_string();
        if is_complete(&self.target, &self.typed) {
            if self.auto_submit_at.is_none() {
                self.auto_submit_at = Some(now + self.auto_submit_delay);
            }
        } else {
            self.auto_submit_at = None;
        }
    }

    /// Builds the one submission of this phase. Returns `None` once a
    /// submission already happened.
    pub fn submit(&mut self, finished: bool, now: Instant) -> Option<ClientMessage> {
        if self.submitted {
            return None;
        }
        self.submitted = true;
        self.auto_submit_at = None;

        let completion_time_ms = if finished {
            self.started_at
                .map(|start| now.saturating_duration_since(start).as_millis() as u64)
        } else {
            None
        };
        debug!(
            "Submitting typing (finished: {}, time: {:?})",
            finished, completion_time_ms
        );
        Some(ClientMessage::SubmitTyping {
            typed_text: self.typed.clone(),
            completion_time_ms,
        })
    }

    /// Fires the deferred automatic submission once its delay has passed.
    pub fn poll_auto_submit(&mut self, now: Instant) -> Option<ClientMessage> {
        match self.auto_submit_at {
            Some(due) if now >= due => self.submit(true, now),
            _ => None,
        }
    }
}
