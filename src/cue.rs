use std::collections::VecDeque;
use std::process::{Child, Command, Stdio};

use crate::engine::range::Key;

/// Spoken before every number.
pub const CUE_PREFIX: &str = "Next number";

/// Voices a key. The last phrase stays readable for the status line.
///
/// Phrases are spoken one at a time: the next phrase starts only after the
/// previous speech process has exited. Call [`Speaker::pump`] regularly.
pub struct Speaker {
    command: Option<String>,
    last_phrase: Option<String>,
    queue: VecDeque<String>,
    active: Option<Child>,
}

impl Speaker {
    pub fn new(command: Option<String>) -> Self {
        Self {
            command: command.filter(|c| !c.trim().is_empty()),
            last_phrase: None,
            queue: VecDeque::new(),
            active: None,
        }
    }

    pub fn phrases(key: &Key) -> [String; 2] {
        [CUE_PREFIX.to_string(), key.to_string()]
    }

    pub fn speak(&mut self, key: &Key) {
        let phrases = Self::phrases(key);
        tracing::debug!(key = %key, "speaking cue");
        self.last_phrase = Some(phrases.join(" "));
        if self.command.is_some() {
            self.queue.extend(phrases);
            self.pump();
        }
    }

    /// Reap the running speech process and start the next queued phrase.
    pub fn pump(&mut self) {
        if let Some(child) = self.active.as_mut() {
            match child.try_wait() {
                Ok(None) => return,
                Ok(Some(_)) => self.active = None,
                Err(err) => {
                    tracing::warn!(%err, "lost track of speech process");
                    self.active = None;
                }
            }
        }
        let Some(ref command) = self.command else {
            return;
        };
        while let Some(phrase) = self.queue.pop_front() {
            match spawn_speech(command, &phrase) {
                Ok(Some(child)) => {
                    self.active = Some(child);
                    return;
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(%err, command = %command, "speech command failed");
                    self.queue.clear();
                    return;
                }
            }
        }
    }

    /// Nothing speaking and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub fn last_phrase(&self) -> Option<&str> {
        self.last_phrase.as_deref()
    }

    /// Forget the last phrase and drop phrases not yet started.
    pub fn clear(&mut self) {
        self.last_phrase = None;
        self.queue.clear();
    }
}

/// `command` is split on whitespace; the phrase is appended as the last argument.
fn spawn_speech(command: &str, phrase: &str) -> std::io::Result<Option<Child>> {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return Ok(None);
    };
    Command::new(program)
        .args(parts)
        .arg(phrase)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrases() {
        assert_eq!(
            Speaker::phrases(&Key::from("07")),
            ["Next number".to_string(), "07".to_string()]
        );
    }

    #[test]
    fn test_speak_without_command_records_phrase() {
        let mut speaker = Speaker::new(Some("   ".to_string()));
        assert!(speaker.last_phrase().is_none());
        speaker.speak(&Key::from("42"));
        assert_eq!(speaker.last_phrase(), Some("Next number 42"));
        speaker.clear();
        assert!(speaker.last_phrase().is_none());
    }

    #[test]
    fn test_missing_program_is_not_fatal() {
        let mut speaker = Speaker::new(Some("definitely-not-a-speech-binary-xyz".to_string()));
        speaker.speak(&Key::from("5"));
        assert_eq!(speaker.last_phrase(), Some("Next number 5"));
        assert!(speaker.is_idle());
    }

    #[cfg(unix)]
    #[test]
    fn test_phrases_are_spoken_in_order() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::time::{Duration, Instant};

        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("spoken.txt");
        let script = dir.path().join("say.sh");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\nsleep 0.05\necho \"$1\" >> '{}'\n",
                out.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut speaker = Speaker::new(Some(script.display().to_string()));
        speaker.speak(&Key::from("42"));
        assert!(!speaker.is_idle());

        let deadline = Instant::now() + Duration::from_secs(10);
        while !speaker.is_idle() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            speaker.pump();
        }
        assert!(speaker.is_idle());

        let spoken = fs::read_to_string(&out).unwrap();
        assert_eq!(spoken.lines().collect::<Vec<_>>(), vec!["Next number", "42"]);
    }
}
