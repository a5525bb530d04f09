//! Console progress animation.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

pub const SNAKE_FRAMES: [&str; 18] = [
    "[        ]",
    "[=       ]",
    "[==      ]",
    "[===     ]",
    "[====    ]",
    "[=====   ]",
    "[======  ]",
    "[======= ]",
    "[========]",
    "[ =======]",
    "[  ======]",
    "[   =====]",
    "[    ====]",
    "[     ===]",
    "[      ==]",
    "[       =]",
    "[        ]",
    "[        ]",
];

const DOTS_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationStyle {
    #[default]
    Snake,
    Dots,
}

impl AnimationStyle {
    /// Frame for `counter` and the counter to pass next time. Never fails:
    /// a counter past the last snake frame shows the first one.
    pub fn next_frame(self, counter: usize) -> (String, usize) {
        match self {
            AnimationStyle::Snake => {
                let next = counter % SNAKE_FRAMES.len() + 1;
                let frame = SNAKE_FRAMES.get(next).copied().unwrap_or(SNAKE_FRAMES[0]);
                (frame.to_string(), next)
            }
            AnimationStyle::Dots => {
                let next = counter % DOTS_WIDTH + 1;
                (format!("{:<width$}", ".".repeat(next), width = DOTS_WIDTH), next)
            }
        }
    }
}

/// Cycles through the frames of one style.
#[derive(Debug, Clone, Default)]
pub struct ProgressAnimator {
    style: AnimationStyle,
    counter: usize,
}

impl ProgressAnimator {
    pub fn new(style: AnimationStyle) -> Self {
        Self { style, counter: 0 }
    }

    pub fn style(&self) -> AnimationStyle {
        self.style
    }

    pub fn set_style(&mut self, style: AnimationStyle) {
        self.style = style;
        self.counter = 0;
    }

    pub fn advance(&mut self) -> String {
        let (frame, next) = self.style.next_frame(self.counter);
        self.counter = next;
        frame
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

/// What the harness shows while an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Frame { message: String, frame: String },
    Finished { line: String },
}

/// Destination for progress output.
pub trait ProgressSink: Send {
    fn emit(&mut self, event: &ProgressEvent);
}

/// Redraws a single status line on stdout.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl ProgressSink for TerminalSink {
    fn emit(&mut self, event: &ProgressEvent) {
        let mut out = io::stdout().lock();
        // progress output is best effort
        let _ = match event {
            ProgressEvent::Frame { message, frame } => write!(out, "\r {} {}", message, frame),
            ProgressEvent::Finished { line } => writeln!(out, "\r {}", line),
        };
        let _ = out.flush();
    }
}

#[derive(Debug, Default)]
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn emit(&mut self, _event: &ProgressEvent) {}
}

/// Keeps every event; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn frame_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Frame { .. }))
            .count()
    }

    pub fn final_line(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|e| match e {
            ProgressEvent::Finished { line } => Some(line),
            ProgressEvent::Frame { .. } => None,
        })
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&mut self, event: &ProgressEvent) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn snake_walks_frames_then_shows_first_on_overflow() {
        let mut animator = ProgressAnimator::new(AnimationStyle::Snake);
        let frames: Vec<String> = (0..20).map(|_| animator.advance()).collect();
        assert_eq!(frames[0], SNAKE_FRAMES[1]);
        assert_eq!(frames[16], SNAKE_FRAMES[17]);
        // counter 18 is past the end
        assert_eq!(frames[17], SNAKE_FRAMES[0]);
        assert_eq!(frames[18], SNAKE_FRAMES[1]);
    }

    #[test]
    fn dots_cycle_one_to_three() {
        let mut animator = ProgressAnimator::new(AnimationStyle::Dots);
        let frames: Vec<String> = (0..4).map(|_| animator.advance()).collect();
        assert_eq!(frames, vec![".  ", ".. ", "...", ".  "]);
    }

    #[test]
    fn switching_style_restarts() {
        let mut animator = ProgressAnimator::new(AnimationStyle::Snake);
        animator.advance();
        animator.set_style(AnimationStyle::Dots);
        assert_eq!(animator.advance(), ".  ");
    }

    #[test]
    fn recording_sink_shares_log_between_clones() {
        let sink = RecordingSink::new();
        let mut writer = sink.clone();
        writer.emit(&ProgressEvent::Frame {
            message: "m".into(),
            frame: ".  ".into(),
        });
        writer.emit(&ProgressEvent::Finished { line: "done".into() });
        assert_eq!(sink.frame_count(), 1);
        assert_eq!(sink.final_line().as_deref(), Some("done"));
    }

    proptest! {
        #[test]
        fn any_counter_yields_a_frame(counter in any::<usize>()) {
            let (frame, next) = AnimationStyle::Snake.next_frame(counter);
            prop_assert!(SNAKE_FRAMES.contains(&frame.as_str()));
            prop_assert!((1..=SNAKE_FRAMES.len()).contains(&next));
            let (dots, next) = AnimationStyle::Dots.next_frame(counter);
            prop_assert_eq!(dots.len(), 3);
            prop_assert!((1..=3).contains(&next));
        }
    }
}
