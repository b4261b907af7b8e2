//! The overlay controller: one owned state record plus the composition of
//! locator, stability gate, draft store and commit pipeline.
//!
//! The embedding page forwards its events (`on_input`, `on_key`,
//! `on_mutation`, `on_resize`, pointer clicks) and calls [`PlainComposer::tick`]
//! from its timer. Every entry point takes the host by reference; nothing
//! from the host is kept between calls.

use crate::buffer::{Autogrow, OverlayBuffer};
use crate::commit::{submit_strategies, CommitAttempt, CommitPoll, CommitTask};
use crate::drafts::{DraftKey, DraftSettings, DraftStore};
use crate::host::{is_visible, HostDom};
use crate::hotkey::{FocusTarget, Hotkey, Key, KeyEvent};
use crate::layout::{GeometrySample, GeometrySampler, Observation, StabilityTracker};
use crate::locator::{HostAnchor, HostLocator};
use crate::notify::WarningSink;
use crate::scheduler::{Interval, Throttle};
use crate::settings::Settings;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Overlay in use, host control hidden.
    Plain,
    /// User switched back to the host's own control.
    Native,
}

/// What a renderer needs to draw the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub displayed: bool,
    /// Faded in. Stays false until the layout has locked.
    pub revealed: bool,
    pub left_px: Option<f64>,
    pub width_px: Option<f64>,
    pub thread_max_width_px: f64,
    pub height_px: f64,
    pub focused: bool,
    pub return_button_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Started,
    /// A commit is already in flight.
    Busy,
    /// Nothing but whitespace to send.
    Empty,
    /// Not installed or already torn down.
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Handled,
    PassThrough,
}

#[derive(Debug)]
struct SessionState {
    mode: Mode,
    displayed: bool,
    revealed: bool,
    return_button_visible: bool,
    native_seen_once: bool,
    geometry: Option<GeometrySample>,
    installed: bool,
    torn_down: bool,
}

pub struct PlainComposer<S: KeyValueStore> {
    settings: Settings,
    locator: HostLocator,
    state: SessionState,
    buffer: OverlayBuffer,
    autogrow: Autogrow,
    sampler: GeometrySampler,
    stability: StabilityTracker,
    drafts: DraftStore<S>,
    cadence: Interval,
    mutations: Throttle<()>,
    commit: Option<CommitTask>,
    last_commit: Option<CommitAttempt>,
    focus_hotkey: Option<Hotkey>,
    warnings: Box<dyn WarningSink>,
}

impl<S: KeyValueStore> PlainComposer<S> {
    pub fn new(settings: Settings, store: S, warnings: Box<dyn WarningSink>) -> Self {
        Self {
            locator: HostLocator::default(),
            state: SessionState {
                mode: Mode::Plain,
                displayed: true,
                revealed: false,
                return_button_visible: false,
                native_seen_once: false,
                geometry: None,
                installed: false,
                torn_down: false,
            },
            buffer: OverlayBuffer::default(),
            autogrow: Autogrow::from_settings(&settings),
            sampler: GeometrySampler::new(settings.fallback_thread_max_width_px),
            stability: StabilityTracker::from_settings(&settings),
            drafts: DraftStore::new(store, DraftSettings::from_settings(&settings)),
            cadence: Interval::new(settings.stable_check_interval_ms),
            mutations: Throttle::new(settings.mutation_throttle_ms),
            commit: None,
            last_commit: None,
            focus_hotkey: settings.focus_hotkey(),
            warnings,
            settings,
        }
    }

    pub fn with_locator(mut self, locator: HostLocator) -> Self {
        self.locator = locator;
        self
    }

    /// First sync and start of the fast cadence.
    pub fn install<H: HostDom + ?Sized>(&mut self, host: &mut H, now_ms: u64) {
        if self.state.installed || self.state.torn_down {
            return;
        }
        self.state.installed = true;
        self.buffer.regrow(&self.autogrow, host.viewport().height);
        self.cadence.start(now_ms);
        self.sync(host, now_ms);
        tracing::info!(
            fast_ms = self.settings.stable_check_interval_ms,
            slow_ms = self.settings.post_lock_sync_interval_ms,
            mutation_throttle_ms = self.settings.mutation_throttle_ms,
            "plain composer installed"
        );
    }

    /// Drive timers. Returns the commit attempt that finished during this
    /// tick, if any.
    pub fn tick<H: HostDom + ?Sized>(&mut self, host: &mut H, now_ms: u64) -> Option<CommitAttempt> {
        if !self.is_active() {
            return None;
        }
        let finished = self.drive_commit(host, now_ms);
        self.drafts.poll(now_ms);
        let mut resync = self.mutations.poll(now_ms).is_some();
        resync |= self.cadence.poll(now_ms);
        if resync {
            self.sync(host, now_ms);
        }
        finished
    }

    pub fn on_input<H: HostDom + ?Sized>(&mut self, host: &mut H, text: &str, now_ms: u64) {
        if !self.is_active() {
            return;
        }
        self.buffer.set_text(text);
        self.buffer.regrow(&self.autogrow, host.viewport().height);
        self.drafts.save(text, now_ms);
    }

    /// Host DOM changed. Re-syncs at most once per throttle interval.
    pub fn on_mutation<H: HostDom + ?Sized>(&mut self, host: &mut H, now_ms: u64) {
        if !self.is_active() {
            return;
        }
        if self.mutations.call(now_ms, ()).is_some() {
            self.sync(host, now_ms);
        }
    }

    pub fn on_resize<H: HostDom + ?Sized>(&mut self, host: &mut H, now_ms: u64) {
        if !self.is_active() {
            return;
        }
        self.buffer.regrow(&self.autogrow, host.viewport().height);
        let anchor = self.locator.resolve(host);
        self.align(host, &anchor, now_ms);
    }

    pub fn on_key<H: HostDom + ?Sized>(
        &mut self,
        host: &mut H,
        event: KeyEvent,
        focus: FocusTarget,
        now_ms: u64,
    ) -> KeyDisposition {
        if !self.is_active() {
            return KeyDisposition::PassThrough;
        }
        if focus == FocusTarget::Overlay {
            return match event.key {
                Key::Enter if self.is_send_chord(&event) => {
                    self.submit(host, now_ms);
                    KeyDisposition::Handled
                }
                Key::Escape => {
                    self.toggle(host, now_ms);
                    KeyDisposition::Handled
                }
                _ => KeyDisposition::PassThrough,
            };
        }
        if focus.is_typing_elsewhere() {
            return KeyDisposition::PassThrough;
        }
        if event.key == Key::Escape && self.settings.global_esc_toggle {
            self.toggle(host, now_ms);
            return KeyDisposition::Handled;
        }
        if self.focus_hotkey.map_or(false, |hk| hk.matches(&event)) {
            self.focus_overlay(host, now_ms, true);
            return KeyDisposition::Handled;
        }
        KeyDisposition::PassThrough
    }

    /// Start handing the overlay text to the host.
    pub fn submit<H: HostDom + ?Sized>(&mut self, host: &mut H, now_ms: u64) -> SubmitOutcome {
        if !self.is_active() {
            return SubmitOutcome::Inactive;
        }
        if self.commit.is_some() {
            tracing::debug!("submit ignored: commit already in flight");
            return SubmitOutcome::Busy;
        }
        let text = self.buffer.text().to_string();
        if text.trim().is_empty() {
            return SubmitOutcome::Empty;
        }
        let strategies = submit_strategies(&self.settings);
        self.commit = Some(CommitTask::new(text, strategies));
        self.drive_commit(host, now_ms);
        SubmitOutcome::Started
    }

    pub fn toggle<H: HostDom + ?Sized>(&mut self, host: &mut H, now_ms: u64) {
        if !self.is_active() {
            return;
        }
        match self.state.mode {
            Mode::Plain => self.show_native(host),
            Mode::Native => self.enter_plain(host, now_ms),
        }
    }

    /// The "return to plain composer" affordance.
    pub fn return_to_plain<H: HostDom + ?Sized>(&mut self, host: &mut H, now_ms: u64) {
        if self.is_active() {
            self.enter_plain(host, now_ms);
        }
    }

    pub fn focus_overlay<H: HostDom + ?Sized>(&mut self, host: &mut H, now_ms: u64, reveal_if_hidden: bool) {
        if !self.is_active() {
            return;
        }
        if reveal_if_hidden {
            self.enter_plain(host, now_ms);
        } else {
            let anchor = self.locator.resolve(host);
            self.align(host, &anchor, now_ms);
            self.buffer.set_focused(true);
        }
    }

    /// Stop every timer, abandon an in-flight commit and give the page its
    /// own control back. All entry points are no-ops afterwards.
    pub fn teardown<H: HostDom + ?Sized>(&mut self, host: &mut H, now_ms: u64) {
        if self.state.torn_down {
            return;
        }
        self.state.torn_down = true;
        self.cadence.cancel();
        self.mutations.cancel();
        self.drafts.flush(now_ms);
        if let Some(mut task) = self.commit.take() {
            self.last_commit = Some(task.cancel(host, &self.locator, false));
        }
        if let Some(control) = self.locator.resolve_input(host) {
            if host.is_suppressed(control) {
                host.set_suppressed(control, false);
            }
        }
        self.state.displayed = false;
        self.state.return_button_visible = false;
        tracing::info!("plain composer torn down");
    }

    pub fn view(&self) -> OverlayView {
        OverlayView {
            displayed: self.state.displayed,
            revealed: self.state.revealed,
            left_px: self.state.geometry.map(|g| g.left),
            width_px: self.state.geometry.map(|g| g.width),
            thread_max_width_px: self.sampler.thread_max_width(),
            height_px: self.buffer.height_px(),
            focused: self.buffer.is_focused(),
            return_button_visible: self.state.return_button_visible,
        }
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn is_locked(&self) -> bool {
        self.stability.is_locked()
    }

    pub fn is_active(&self) -> bool {
        self.state.installed && !self.state.torn_down
    }

    pub fn sync_period_ms(&self) -> u64 {
        self.cadence.period_ms()
    }

    pub fn commit_in_flight(&self) -> bool {
        self.commit.is_some()
    }

    pub fn last_commit(&self) -> Option<&CommitAttempt> {
        self.last_commit.as_ref()
    }

    pub fn drafts(&self) -> &DraftStore<S> {
        &self.drafts
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn is_send_chord(&self, event: &KeyEvent) -> bool {
        if self.settings.send_hotkey_requires_ctrl_or_cmd {
            event.ctrl || event.meta
        } else {
            !event.shift
        }
    }

    fn suppress_wanted(&self) -> bool {
        self.settings.hide_original_composer && self.state.mode == Mode::Plain
    }

    fn drive_commit<H: HostDom + ?Sized>(&mut self, host: &mut H, now_ms: u64) -> Option<CommitAttempt> {
        let keep_hidden = self.suppress_wanted();
        let task = self.commit.as_mut()?;
        let CommitPoll::Done(attempt) = task.poll(now_ms, host, &self.locator, keep_hidden) else {
            return None;
        };
        self.commit = None;
        self.settle(&attempt, host.viewport().height, now_ms);
        self.last_commit = Some(attempt.clone());
        Some(attempt)
    }

    /// Only a successful attempt removes text, and only the text it sent:
    /// input typed while the commit was in flight stays in the buffer.
    fn settle(&mut self, attempt: &CommitAttempt, viewport_height: f64, now_ms: u64) {
        if !attempt.success() {
            self.buffer.set_focused(true);
            if let Some(err) = attempt.error() {
                self.warnings.warn(&err.to_string());
            }
            return;
        }
        let remainder = self
            .buffer
            .text()
            .strip_prefix(attempt.text.as_str())
            .map(str::to_string);
        match remainder {
            Some(rest) => self.buffer.set_text(rest),
            None => tracing::debug!("overlay changed during commit; keeping its text"),
        }
        if self.settings.clear_draft_on_send {
            self.drafts.clear();
        }
        if !self.buffer.text().is_empty() {
            self.drafts.save(self.buffer.text(), now_ms);
        }
        self.buffer.regrow(&self.autogrow, viewport_height);
        tracing::info!(strategies = attempt.strategies.len(), "message handed to host");
    }

    /// One synchronization cycle: re-resolve, keep the host control hidden,
    /// follow the draft key, re-anchor.
    fn sync<H: HostDom + ?Sized>(&mut self, host: &mut H, now_ms: u64) {
        let anchor = self.locator.resolve(host);
        match anchor.input_control {
            Some(control) => {
                let visible = is_visible(host, control);
                if visible && !self.state.native_seen_once {
                    tracing::debug!("host input control seen");
                    self.state.native_seen_once = true;
                }
                if visible && self.suppress_wanted() && self.commit.is_none() {
                    host.set_suppressed(control, true);
                }
            }
            None => tracing::trace!("host input control not resolved"),
        }
        self.follow_draft_key(host, now_ms);
        self.align(host, &anchor, now_ms);
    }

    fn follow_draft_key<H: HostDom + ?Sized>(&mut self, host: &H, now_ms: u64) {
        if !self.drafts.is_enabled() {
            return;
        }
        let Some(key) = DraftKey::from_location(&host.location()) else {
            return;
        };
        if self.drafts.current_key() == Some(&key) {
            return;
        }
        if let Some(text) = self.drafts.switch_key(key, now_ms) {
            if text != self.buffer.text() {
                self.buffer.set_text(text);
                self.buffer.regrow(&self.autogrow, host.viewport().height);
            }
        }
    }

    fn align<H: HostDom + ?Sized>(&mut self, host: &H, anchor: &HostAnchor, now_ms: u64) {
        let Some(sample) = self.sampler.sample(host, anchor, now_ms) else {
            return;
        };
        self.state.geometry = Some(sample);
        match self.stability.observe(sample, self.state.native_seen_once) {
            Observation::Locked => {
                self.state.revealed = true;
                self.cadence
                    .set_period(now_ms, self.settings.post_lock_sync_interval_ms);
                tracing::info!(
                    left = sample.left,
                    width = sample.width,
                    max_width = sample.container_max_width,
                    "overlay revealed"
                );
            }
            Observation::Settling { streak } => tracing::trace!(streak, "layout settling"),
            Observation::Steady => {}
        }
    }

    fn show_native<H: HostDom + ?Sized>(&mut self, host: &mut H) {
        let Some(control) = self.locator.resolve_input(host) else {
            tracing::debug!("toggle ignored: host input control not found");
            return;
        };
        host.set_suppressed(control, false);
        self.state.mode = Mode::Native;
        if self.settings.hide_plain_composer_when_original_shown {
            self.state.displayed = false;
        }
        self.state.return_button_visible = self.settings.show_return_button_when_original_shown;
        self.buffer.set_focused(false);
        host.focus(control);
        tracing::debug!("switched to native composer");
    }

    fn enter_plain<H: HostDom + ?Sized>(&mut self, host: &mut H, now_ms: u64) {
        self.state.mode = Mode::Plain;
        self.state.displayed = true;
        self.state.return_button_visible = false;
        if let Some(control) = self.locator.resolve_input(host) {
            if self.suppress_wanted() && self.commit.is_none() && is_visible(host, control) {
                host.set_suppressed(control, true);
            }
        }
        let anchor = self.locator.resolve(host);
        self.align(host, &anchor, now_ms);
        self.buffer.regrow(&self.autogrow, host.viewport().height);
        self.buffer.set_focused(true);
        tracing::debug!("switched to plain composer");
    }
}
