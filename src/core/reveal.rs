//! Typewriter-style reveal of assistant replies.
//!
//! [`RevealFrames`] is the pure part: it yields every growing prefix of the
//! text, one grapheme cluster at a time. [`run_reveal`] paces those frames on a
//! tokio interval and stops cooperatively when its cancellation token fires.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use unicode_segmentation::{GraphemeIndices, UnicodeSegmentation};

use crate::core::controller::ControllerEvent;

pub struct RevealFrames<'a> {
    text: &'a str,
    graphemes: GraphemeIndices<'a>,
}

impl<'a> RevealFrames<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            graphemes: text.grapheme_indices(true),
        }
    }
}

impl<'a> Iterator for RevealFrames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, grapheme) = self.graphemes.next()?;
        Some(&self.text[..start + grapheme.len()])
    }
}

/// Emit one [`ControllerEvent::RevealFrame`] per tick, then
/// [`ControllerEvent::RevealFinished`] on the tick after the last frame.
///
/// A zero `cadence` sends the full text in a single frame. Nothing is sent
/// once `cancel_token` is cancelled.
pub async fn run_reveal(
    reveal_id: u64,
    text: String,
    cadence: Duration,
    cancel_token: CancellationToken,
    tx: mpsc::UnboundedSender<ControllerEvent>,
) {
    if cadence.is_zero() {
        if cancel_token.is_cancelled() {
            return;
        }
        if !text.is_empty() {
            let _ = tx.send(ControllerEvent::RevealFrame {
                reveal_id,
                prefix: text,
            });
        }
        let _ = tx.send(ControllerEvent::RevealFinished { reveal_id });
        return;
    }

    let mut ticker = tokio::time::interval(cadence);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of a tokio interval completes immediately.
    ticker.tick().await;

    let mut frames = RevealFrames::new(&text);
    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                debug!(reveal_id, "reveal stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        let event = match frames.next() {
            Some(prefix) => ControllerEvent::RevealFrame {
                reveal_id,
                prefix: prefix.to_string(),
            },
            None => ControllerEvent::RevealFinished { reveal_id },
        };
        let finished = matches!(event, ControllerEvent::RevealFinished { .. });
        if tx.send(event).is_err() || finished {
            return;
        }
    }
}
