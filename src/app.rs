use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::{Config, MAX_DELAY_SECS, MAX_FLASH_SPEED_MS, MAX_SEQUENCE_COUNT, MIN_FLASH_SPEED_MS, Overrides};
use crate::cue::Speaker;
use crate::engine::range::{self, Key, RangeSpec};
use crate::session::flash::FlashSession;
use crate::session::reveal::{self, Presentation, RevealEvent};
use crate::session::sequence::{CheckKind, CheckOutcome, SequenceSession};
use crate::store::json_store::{self, JsonStore};
use crate::timer::{TimerId, Timers};
use crate::ui::components::menu::{Menu, MenuAction};
use crate::ui::components::word_table::EditField;
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;
use crate::words::{self, EditGroup, WordMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    Sequence,
    Flash,
    Words,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    Reveal(RevealEvent),
    FlashTick,
}

/// Sequence trainer screen state.
#[derive(Default)]
pub struct TrainerState {
    /// Number currently on screen, if any.
    pub display: Option<Key>,
    pub reveal_timers: Vec<TimerId>,
    /// Waiting for the user to confirm before the run starts.
    pub awaiting_ready: bool,
    pub answer: Option<(CheckKind, LineInput)>,
    pub outcomes: Vec<CheckOutcome>,
}

/// Flash drill screen state.
#[derive(Default)]
pub struct FlashState {
    pub timer: Option<TimerId>,
}

impl FlashState {
    pub fn running(&self) -> bool {
        self.timer.is_some()
    }
}

/// Word editor screen state.
pub struct EditorState {
    pub groups: Vec<EditGroup>,
    pub group: usize,
    pub row: usize,
    pub editing: Option<(EditField, LineInput)>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            groups: words::edit_groups(),
            group: 0,
            row: 0,
            editing: None,
        }
    }
}

impl EditorState {
    pub fn selected_key(&self) -> Option<&Key> {
        self.groups.get(self.group)?.keys.get(self.row)
    }
}

pub struct App {
    pub screen: AppScreen,
    /// Effective settings for this run: the config file plus CLI overrides.
    pub config: Config,
    /// The config file as loaded, with only settings changed in the TUI
    /// applied on top.
    pub file_config: Config,
    pub settings_changed: bool,
    pub theme: &'static Theme,
    pub menu: Menu<'static>,
    pub sequence: SequenceSession,
    pub flash: FlashSession,
    pub words: WordMap,
    pub store: Option<JsonStore>,
    pub speaker: Speaker,
    pub timers: Timers<TimerEvent>,
    pub trainer: TrainerState,
    pub flash_state: FlashState,
    pub editor: EditorState,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        file_config: Config,
        overrides: &Overrides,
        words: WordMap,
        store: Option<JsonStore>,
    ) -> Self {
        Self::with_sessions(
            file_config,
            overrides,
            words,
            store,
            SequenceSession::new(),
            FlashSession::new(),
        )
    }

    pub fn with_sessions(
        file_config: Config,
        overrides: &Overrides,
        words: WordMap,
        store: Option<JsonStore>,
        sequence: SequenceSession,
        flash: FlashSession,
    ) -> Self {
        let mut config = file_config.clone();
        overrides.apply(&mut config);
        let loaded_theme = Theme::load(&config.theme).unwrap_or_else(|| {
            tracing::warn!(
                theme = %config.theme,
                available = ?Theme::available_themes(),
                "unknown theme, using default"
            );
            Theme::default()
        });
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        let speaker = Speaker::new(config.speech_command.clone());

        Self {
            screen: AppScreen::Menu,
            menu: Menu::new(theme),
            theme,
            config,
            file_config,
            settings_changed: false,
            sequence,
            flash,
            words,
            store,
            speaker,
            timers: Timers::new(),
            trainer: TrainerState::default(),
            flash_state: FlashState::default(),
            editor: EditorState::default(),
            status: None,
            should_quit: false,
        }
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(msg.into());
    }

    pub fn activate(&mut self, action: MenuAction) {
        self.status = None;
        match action {
            MenuAction::Sequence => self.screen = AppScreen::Sequence,
            MenuAction::Flash => self.screen = AppScreen::Flash,
            MenuAction::Words => self.open_words(),
            MenuAction::Quit => self.quit(),
        }
    }

    pub fn go_to_menu(&mut self) {
        if self.screen == AppScreen::Flash {
            self.stop_flash();
        }
        self.screen = AppScreen::Menu;
        self.status = None;
    }

    pub fn quit(&mut self) {
        self.stop_flash();
        if let Some(config) = self.config_to_save() {
            if let Err(err) = config.save() {
                tracing::warn!(%err, "failed to save config");
            }
        }
        self.should_quit = true;
    }

    /// The config to write on exit, if any setting was changed in the TUI.
    pub fn config_to_save(&self) -> Option<&Config> {
        self.settings_changed.then_some(&self.file_config)
    }

    /// Apply a settings change made in the TUI to this run and to the
    /// config file copy.
    fn change_setting(&mut self, apply: impl Fn(&mut Config)) {
        apply(&mut self.config);
        apply(&mut self.file_config);
        self.settings_changed = true;
    }

    /// Run every timer that is due.
    pub fn on_tick(&mut self, now: Instant) {
        for event in self.timers.take_due(now) {
            match event {
                TimerEvent::Reveal(reveal) => {
                    for p in reveal.presentations(self.config.voice) {
                        self.present(p);
                    }
                }
                TimerEvent::FlashTick => {
                    self.flash_next();
                }
            }
        }
        self.speaker.pump();
    }

    fn present(&mut self, presentation: Presentation) {
        match presentation {
            Presentation::Show(key) => self.trainer.display = Some(key),
            Presentation::Hide => self.trainer.display = None,
            Presentation::SpeakCue(key) => self.speaker.speak(&key),
        }
    }

    // ---- sequence trainer ----

    /// Start a run, or ask for confirmation first when manual start is on.
    pub fn request_start(&mut self, now: Instant) {
        if self.config.sequence.manual_start {
            self.trainer.awaiting_ready = true;
            self.set_status("Press Enter when ready to begin.");
        } else {
            self.start_sequence(now);
        }
    }

    pub fn confirm_ready(&mut self, now: Instant) {
        if self.trainer.awaiting_ready {
            self.trainer.awaiting_ready = false;
            self.start_sequence(now);
        }
    }

    pub fn start_sequence(&mut self, now: Instant) {
        self.timers.cancel_all(self.trainer.reveal_timers.drain(..));
        self.trainer.display = None;
        self.trainer.answer = None;
        self.trainer.outcomes.clear();
        self.speaker.clear();

        let seq_config = &self.config.sequence;
        let sequence = match self.sequence.start(
            &seq_config.range,
            seq_config.count,
            self.config.sequence_policy(),
        ) {
            Ok(seq) => seq,
            Err(err) => {
                tracing::warn!(%err, "could not start sequence");
                self.set_status(err.to_string());
                return;
            }
        };
        tracing::info!(
            range = %seq_config.range,
            count = sequence.len(),
            history = self.sequence.history().len(),
            "sequence started"
        );

        for timed in reveal::schedule(&sequence, self.config.pause(), self.config.flash_duration()) {
            let Some(deadline) = now.checked_add(timed.at) else {
                tracing::warn!(at = ?timed.at, "reveal offset out of range, dropping the rest");
                break;
            };
            let id = self
                .timers
                .once(deadline, TimerEvent::Reveal(timed.event));
            self.trainer.reveal_timers.push(id);
        }
        self.set_status(format!("Watch: {} numbers", sequence.len()));
    }

    pub fn revealing(&self) -> bool {
        self.trainer
            .reveal_timers
            .iter()
            .any(|id| self.timers.is_pending(*id))
    }

    pub fn open_answer(&mut self, kind: CheckKind) {
        self.trainer.answer = Some((kind, LineInput::new("")));
    }

    pub fn cancel_answer(&mut self) {
        self.trainer.answer = None;
    }

    pub fn submit_answer(&mut self) {
        let Some((kind, input)) = self.trainer.answer.take() else {
            return;
        };
        match self
            .sequence
            .check(kind, input.value(), self.config.scoring_policy)
        {
            Some(score) => {
                tracing::debug!(?kind, exact = score.is_exact(), "answer checked");
                self.trainer.outcomes.retain(|o| o.kind != kind);
                self.trainer.outcomes.push(CheckOutcome { kind, score });
                self.status = None;
            }
            None => self.set_status("Start a sequence first."),
        }
    }

    pub fn partial_kind(&self, backward: bool) -> CheckKind {
        let n = self.config.sequence.partial_count;
        if backward {
            CheckKind::PartialBackward(n)
        } else {
            CheckKind::PartialForward(n)
        }
    }

    pub fn clear_history(&mut self) {
        self.sequence.clear();
        self.trainer
            .outcomes
            .retain(|o| matches!(o.kind, CheckKind::Forward | CheckKind::Backward));
        self.set_status("History cleared.");
    }

    pub fn cycle_sequence_range(&mut self, forward: bool) {
        let range = range::cycle(
            self.config.sequence.range,
            self.config.include_all_range,
            forward,
        );
        self.change_setting(|c| c.sequence.range = range);
    }

    pub fn adjust_count(&mut self, delta: isize) {
        let count = self
            .config
            .sequence
            .count
            .saturating_add_signed(delta)
            .clamp(1, MAX_SEQUENCE_COUNT);
        self.change_setting(|c| c.sequence.count = count);
    }

    pub fn adjust_partial_count(&mut self, delta: isize) {
        let count = self
            .config
            .sequence
            .partial_count
            .saturating_add_signed(delta)
            .clamp(1, MAX_SEQUENCE_COUNT);
        self.change_setting(|c| c.sequence.partial_count = count);
    }

    pub fn adjust_pause(&mut self, delta_secs: f64) {
        let pause = half_second_step(self.config.sequence.pause_secs + delta_secs);
        self.change_setting(|c| c.sequence.pause_secs = pause);
    }

    pub fn adjust_flash_secs(&mut self, delta_secs: f64) {
        let flash = half_second_step(self.config.sequence.flash_secs + delta_secs);
        self.change_setting(|c| c.sequence.flash_secs = flash);
    }

    pub fn toggle_sequence_no_repeats(&mut self) {
        let on = !self.config.sequence.no_repeats;
        self.change_setting(|c| c.sequence.no_repeats = on);
    }

    pub fn toggle_manual_start(&mut self) {
        let on = !self.config.sequence.manual_start;
        self.change_setting(|c| c.sequence.manual_start = on);
    }

    pub fn toggle_voice(&mut self) {
        let on = !self.config.voice;
        self.change_setting(|c| c.voice = on);
    }

    // ---- flash drill ----

    pub fn toggle_flash(&mut self, now: Instant) {
        if self.flash_state.running() {
            self.stop_flash();
        } else {
            self.start_flash(now);
        }
    }

    /// Show a number right away, then one every period. Restarting replaces
    /// the recurring timer.
    pub fn start_flash(&mut self, now: Instant) {
        if let Some(id) = self.flash_state.timer.take() {
            self.timers.cancel(id);
        }
        if !self.flash_next() {
            return;
        }
        let period = self.config.flash_period();
        self.flash_state.timer = Some(self.timers.every(now, period, TimerEvent::FlashTick));
        tracing::debug!(period_ms = period.as_millis() as u64, "flash drill running");
    }

    pub fn stop_flash(&mut self) {
        if let Some(id) = self.flash_state.timer.take() {
            self.timers.cancel(id);
            tracing::debug!("flash drill stopped");
        }
        self.flash.stop();
    }

    /// Returns false when nothing could be drawn; the drill is stopped then.
    fn flash_next(&mut self) -> bool {
        let range = self.config.flash.range;
        let policy = self.config.flash_policy();
        let drawn = self
            .flash
            .tick_with_words(&range, policy, &self.words)
            .map(|frame| frame.key.clone());
        let key = match drawn {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(%err, "flash tick failed");
                self.set_status(err.to_string());
                self.stop_flash();
                return false;
            }
        };
        if self.config.voice {
            self.speaker.speak(&key);
        }
        true
    }

    pub fn adjust_flash_speed(&mut self, delta_ms: i64, now: Instant) {
        let speed = self
            .config
            .flash
            .speed_ms
            .saturating_add_signed(delta_ms)
            .clamp(MIN_FLASH_SPEED_MS, MAX_FLASH_SPEED_MS);
        self.change_setting(|c| c.flash.speed_ms = speed);
        if self.flash_state.running() {
            self.start_flash(now);
        }
    }

    /// The range only takes effect at the next tick, where the flash
    /// session notices the change and starts a fresh pass.
    pub fn cycle_flash_range(&mut self, forward: bool) {
        let range = range::cycle(
            self.config.flash.range,
            self.config.include_all_range,
            forward,
        );
        self.change_setting(|c| c.flash.range = range);
    }

    pub fn toggle_flash_no_repeats(&mut self) {
        let on = !self.config.flash.no_repeats;
        self.change_setting(|c| c.flash.no_repeats = on);
    }

    // ---- word editor ----

    pub fn open_words(&mut self) {
        for group in &self.editor.groups {
            self.words.ensure_entries(&group.keys);
        }
        self.screen = AppScreen::Words;
    }

    pub fn editor_move(&mut self, rows: isize, groups: isize) {
        let editor = &mut self.editor;
        let group_count = editor.groups.len() as isize;
        if group_count == 0 {
            return;
        }
        if groups != 0 {
            editor.group = (editor.group as isize + groups).rem_euclid(group_count) as usize;
            editor.row = 0;
        }
        let row_count = editor.groups[editor.group].keys.len() as isize;
        if rows != 0 && row_count > 0 {
            editor.row = (editor.row as isize + rows).clamp(0, row_count - 1) as usize;
        }
    }

    pub fn begin_edit(&mut self, field: EditField) {
        let Some(key) = self.editor.selected_key() else {
            return;
        };
        let entry = self.words.get(key).cloned().unwrap_or_default();
        let input = match field {
            EditField::Word => LineInput::new(&entry.word).with_completions(entry.suggestions),
            EditField::Suggestions => LineInput::new(&entry.suggestions.join(", ")),
        };
        self.editor.editing = Some((field, input));
    }

    pub fn cancel_edit(&mut self) {
        self.editor.editing = None;
    }

    pub fn commit_edit(&mut self) {
        let Some((field, input)) = self.editor.editing.take() else {
            return;
        };
        let Some(key) = self.editor.selected_key().cloned() else {
            return;
        };
        match field {
            EditField::Word => self.words.set_word(&key, input.value()),
            EditField::Suggestions => self.words.set_suggestions(&key, input.value()),
        }
        self.persist_words();
    }

    fn persist_words(&mut self) {
        let Some(ref store) = self.store else {
            return;
        };
        match store.save_overlay(&self.words) {
            Ok(()) => self.set_status("Saved."),
            Err(err) => {
                tracing::error!(%err, "failed to save word edits");
                self.set_status(format!("Could not save: {err}"));
            }
        }
    }

    pub fn export_words(&mut self) {
        let path = self.config.export_path.clone();
        match json_store::export_words(&self.words, Path::new(&path)) {
            Ok(()) => {
                tracing::info!(path = %path, "exported words");
                self.set_status(format!("Exported to {path}"));
            }
            Err(err) => {
                tracing::error!(%err, path = %path, "export failed");
                self.set_status(format!("Export failed: {err}"));
            }
        }
    }

    /// Poll timeout for the event loop: short while anything is scheduled.
    pub fn poll_interval(&self, now: Instant) -> Duration {
        const IDLE: Duration = Duration::from_millis(250);
        const MIN: Duration = Duration::from_millis(5);
        match self.timers.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now).clamp(MIN, IDLE),
            None => IDLE,
        }
    }

    pub fn range_label(range: &RangeSpec) -> String {
        format!("{range} ({} numbers)", range.len())
    }
}

/// Round to half seconds within `0.5..=MAX_DELAY_SECS`.
fn half_second_step(secs: f64) -> f64 {
    (secs.clamp(0.5, MAX_DELAY_SECS) * 2.0).round() / 2.0
}
