use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent};

pub enum AppEvent {
    Key(KeyEvent),
    /// No input within the tick rate. Drives the timer queue.
    Tick,
    Resize,
}

/// Terminal input pumped from a background thread.
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    _tx: mpsc::Sender<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let _tx = tx.clone();

        thread::spawn(move || {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    let forwarded = match event::read() {
                        Ok(Event::Key(key)) => tx.send(AppEvent::Key(key)),
                        Ok(Event::Resize(_, _)) => tx.send(AppEvent::Resize),
                        _ => Ok(()),
                    };
                    if forwarded.is_err() {
                        return;
                    }
                } else if tx.send(AppEvent::Tick).is_err() {
                    return;
                }
            }
        });

        Self { rx, _tx }
    }

    /// Waits at most `timeout`; a timeout reads as a tick.
    pub fn next_timeout(&self, timeout: Duration) -> anyhow::Result<AppEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Ok(event),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(AppEvent::Tick),
            Err(err) => Err(err.into()),
        }
    }
}
