use std::time::Duration;

use crate::engine::range::Key;
use crate::session::sequence::Sequence;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealEvent {
    Show(Key),
    /// Blank the display. Carries the key that was showing so a cue can be
    /// spoken for it.
    Hide(Key),
}

/// What the presentation layer is asked to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Presentation {
    Show(Key),
    Hide,
    SpeakCue(Key),
}

impl RevealEvent {
    pub fn presentations(&self, voice: bool) -> Vec<Presentation> {
        match self {
            RevealEvent::Show(key) => vec![Presentation::Show(key.clone())],
            RevealEvent::Hide(key) if voice => {
                vec![Presentation::Hide, Presentation::SpeakCue(key.clone())]
            }
            RevealEvent::Hide(_) => vec![Presentation::Hide],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedReveal {
    /// Offset from the start of the trial.
    pub at: Duration,
    pub event: RevealEvent,
}

/// Lazily yields a Show and a Hide for every key of a sequence. Item `idx`
/// shows at `idx * pause` and hides at `idx * pause + flash`; a flash longer
/// than the pause simply overlaps the next item.
pub struct RevealSchedule {
    keys: std::vec::IntoIter<Key>,
    pause: Duration,
    flash: Duration,
    idx: u32,
    pending_hide: Option<TimedReveal>,
}

pub fn schedule(sequence: &Sequence, pause: Duration, flash: Duration) -> RevealSchedule {
    RevealSchedule {
        keys: sequence.keys().to_vec().into_iter(),
        pause,
        flash,
        idx: 0,
        pending_hide: None,
    }
}

impl Iterator for RevealSchedule {
    type Item = TimedReveal;

    fn next(&mut self) -> Option<TimedReveal> {
        if let Some(hide) = self.pending_hide.take() {
            return Some(hide);
        }

        let key = self.keys.next()?;
        let shown_at = self.pause.saturating_mul(self.idx);
        self.idx = self.idx.saturating_add(1);
        self.pending_hide = Some(TimedReveal {
            at: shown_at.saturating_add(self.flash),
            event: RevealEvent::Hide(key.clone()),
        });
        Some(TimedReveal {
            at: shown_at,
            event: RevealEvent::Show(key),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.keys.len() * 2 + usize::from(self.pending_hide.is_some());
        (n, Some(n))
    }
}

impl ExactSizeIterator for RevealSchedule {}
