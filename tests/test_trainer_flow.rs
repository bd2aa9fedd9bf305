use std::collections::HashSet;
use std::fs;
use std::time::{Duration, Instant};

use majordrill::engine::range::{self, Key, RangeSpec};
use majordrill::engine::sampling::SamplingPolicy;
use majordrill::engine::scoring::{Score, ScoringPolicy, Verdict, digits_to_string};
use majordrill::session::flash::FlashSession;
use majordrill::session::reveal::{self, Presentation, RevealEvent};
use majordrill::session::sequence::{CheckKind, Sequence, SequenceSession};
use majordrill::store::json_store::{self, JsonStore};
use majordrill::timer::Timers;
use majordrill::words::{WordLookup, WordMap};
use tempfile::TempDir;

#[test]
fn sequence_reveal_then_recall() {
    let mut session = SequenceSession::with_seed(42);
    let range: RangeSpec = "10-19".parse().unwrap();
    let seq = session
        .start(&range, 4, SamplingPolicy::WithoutReplacement)
        .unwrap();

    // drive the reveal through the timer queue the way the TUI does
    let t0 = Instant::now();
    let mut timers = Timers::new();
    for timed in reveal::schedule(&seq, Duration::from_secs(2), Duration::from_secs(1)) {
        timers.once(t0 + timed.at, timed.event);
    }
    let mut shown = Vec::new();
    let mut cues = Vec::new();
    for step in 0..=8 {
        let now = t0 + Duration::from_millis(step * 1000);
        for event in timers.take_due(now) {
            for p in event.presentations(true) {
                match p {
                    Presentation::Show(key) => shown.push(key),
                    Presentation::SpeakCue(key) => cues.push(key),
                    Presentation::Hide => {}
                }
            }
        }
    }
    assert!(timers.is_empty());
    assert_eq!(shown, seq.keys());
    assert_eq!(cues, seq.keys());

    let typed: String = seq.keys().iter().map(Key::as_str).collect();
    let forward = session
        .check(CheckKind::Forward, &typed, ScoringPolicy::CorrectLength)
        .unwrap();
    assert_eq!(forward, Score::ExactMatch);

    let backward = session
        .check(CheckKind::Backward, &typed, ScoringPolicy::CorrectLength)
        .unwrap();
    let reversed: String = typed.chars().rev().collect();
    if typed != reversed {
        assert!(!backward.is_exact());
    }
}

#[test]
fn mixed_width_keys_forward_and_backward() {
    let keys = vec![Key::from("12"), Key::from("07"), Key::from("5")];
    let forward = majordrill::engine::scoring::forward_digits(&keys);
    let backward = majordrill::engine::scoring::backward_digits(&keys);
    assert_eq!(digits_to_string(&forward), "12075");
    assert_eq!(digits_to_string(&backward), "57021");

    let input = majordrill::engine::scoring::normalize("12175");
    match majordrill::engine::scoring::score(&input, &forward, ScoringPolicy::CorrectLength) {
        Score::Scored(seq) => {
            let wrong: Vec<usize> = seq
                .digits
                .iter()
                .enumerate()
                .filter(|(_, d)| d.verdict == Verdict::Incorrect)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(wrong, vec![2]);
            assert_eq!(seq.digits[2].expected, Some(0));
            assert_eq!(seq.digits[2].actual, Some(1));
        }
        Score::ExactMatch => panic!("12175 must not match 12075"),
    }
}

#[test]
fn history_partial_checks_span_recent_sequences() {
    let mut session = SequenceSession::with_seed(3);
    let all = RangeSpec::All;
    let lens: Vec<usize> = [2, 3, 1]
        .into_iter()
        .map(|n| session.start(&all, n, SamplingPolicy::WithReplacement).unwrap().len())
        .collect();
    assert_eq!(lens, vec![2, 3, 1]);
    assert_eq!(session.history().len(), 3);

    let recent = session.target(CheckKind::PartialForward(2)).unwrap();
    // two-digit keys, last two trials had 3 + 1 numbers
    assert_eq!(recent.len(), 8);

    session.clear();
    assert!(session.history().is_empty());
    assert!(session.check(CheckKind::PartialForward(1), "00", ScoringPolicy::default()).is_none());
}

#[test]
fn flash_drill_covers_new_range_before_repeating() {
    let words = WordMap::bundled();
    let mut flash = FlashSession::with_seed(9);
    let first: RangeSpec = "0-9".parse().unwrap();
    for _ in 0..4 {
        flash
            .tick_with_words(&first, SamplingPolicy::WithoutReplacement, &words)
            .unwrap();
    }

    let second: RangeSpec = "30-39".parse().unwrap();
    let mut seen = HashSet::new();
    for _ in 0..second.len() {
        let frame = flash
            .tick_with_words(&second, SamplingPolicy::WithoutReplacement, &words)
            .unwrap();
        assert_eq!(frame.word, words.word(&frame.key));
        seen.insert(frame.key.clone());
    }
    assert_eq!(seen.len(), 10);
}

#[test]
fn cancelled_flash_timer_never_fires() {
    let t0 = Instant::now();
    let mut timers = Timers::new();
    let id = timers.every(t0, Duration::from_millis(500), "tick");
    assert_eq!(timers.take_due(t0 + Duration::from_millis(500)), vec!["tick"]);
    timers.cancel(id);
    assert!(timers.take_due(t0 + Duration::from_secs(10)).is_empty());
}

#[test]
fn edits_survive_restart_and_export() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().join("data")).unwrap();

    let mut words = store.merged_words(WordMap::bundled());
    let key = Key::from("42");
    words.set_word(&key, "rain");
    words.set_suggestions(&key, " rune, ,  urn ");
    store.save_overlay(&words).unwrap();

    let reopened = JsonStore::with_base_dir(dir.path().join("data")).unwrap();
    let merged = reopened.merged_words(WordMap::bundled());
    let entry = merged.get(&key).unwrap();
    assert_eq!(entry.word, "rain");
    assert_eq!(entry.suggestions, vec!["rune".to_string(), "urn".to_string()]);

    let export = dir.path().join("out").join("numbers_export.json");
    json_store::export_words(&merged, &export).unwrap();
    assert_eq!(json_store::load_dataset(&export).unwrap(), merged);
}

#[test]
fn malformed_overlay_keeps_bundled_words() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("number_words.json"), "{ not json").unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();

    let merged = store.merged_words(WordMap::bundled());
    assert_eq!(merged, WordMap::bundled());
}

#[test]
fn catalog_ranges_are_all_usable() {
    let mut session = SequenceSession::with_seed(5);
    for r in range::catalog(true) {
        let seq = session
            .start(&r, r.len(), SamplingPolicy::WithoutReplacement)
            .unwrap();
        let unique: HashSet<&Key> = seq.keys().iter().collect();
        assert_eq!(unique.len(), r.len(), "range {r}");
    }
}

#[test]
fn reveal_events_pair_show_and_hide() {
    let seq = Sequence::from(vec![Key::from("1"), Key::from("2")]);
    let events: Vec<RevealEvent> = reveal::schedule(&seq, Duration::from_secs(3), Duration::from_secs(1))
        .map(|t| t.event)
        .collect();
    assert_eq!(
        events,
        vec![
            RevealEvent::Show(Key::from("1")),
            RevealEvent::Hide(Key::from("1")),
            RevealEvent::Show(Key::from("2")),
            RevealEvent::Hide(Key::from("2")),
        ]
    );
}
