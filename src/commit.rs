//! Hand-off of overlay text to the host's own send path.
//!
//! A commit is a staged pipeline. Each stage either finishes the attempt or
//! asks to be polled again after a short pause so the host can react. The
//! input control is re-resolved at every stage, never carried across a pause.

use crate::error::ComposerError;
use crate::host::{ElementId, EnterPress, HostDom, SyntheticEvent};
use crate::locator::HostLocator;
use crate::settings::Settings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitStrategy {
    /// Native value write plus synthetic `input`/`change`.
    WriteAndNotify,
    CtrlEnter,
    MetaEnter,
    PlainEnter,
    SubmitClick,
}

impl CommitStrategy {
    /// How long the host gets to react before the next check.
    pub fn pause_ms(self) -> u64 {
        match self {
            CommitStrategy::WriteAndNotify => 30,
            CommitStrategy::CtrlEnter | CommitStrategy::MetaEnter | CommitStrategy::PlainEnter => {
                40
            }
            CommitStrategy::SubmitClick => 60,
        }
    }

    fn enter_press(self) -> Option<EnterPress> {
        match self {
            CommitStrategy::CtrlEnter => Some(EnterPress {
                ctrl: true,
                meta: false,
            }),
            CommitStrategy::MetaEnter => Some(EnterPress {
                ctrl: false,
                meta: true,
            }),
            CommitStrategy::PlainEnter => Some(EnterPress::default()),
            _ => None,
        }
    }
}

/// Submit triggers enabled in `settings`, in escalation order.
pub fn submit_strategies(settings: &Settings) -> Vec<CommitStrategy> {
    [
        (settings.try_send_via_ctrl_enter, CommitStrategy::CtrlEnter),
        (settings.try_send_via_meta_enter, CommitStrategy::MetaEnter),
        (settings.try_send_via_plain_enter, CommitStrategy::PlainEnter),
        (settings.try_send_via_send_button, CommitStrategy::SubmitClick),
    ]
    .into_iter()
    .filter_map(|(enabled, strategy)| enabled.then_some(strategy))
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The host changed its control's value: it took the message.
    Sent,
    /// Every strategy ran and the value never changed.
    Exhausted,
    /// The input control could not be found.
    ControlMissing,
    /// Torn down between stages.
    Cancelled,
}

/// Record of one finished commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAttempt {
    pub text: String,
    pub strategies: Vec<CommitStrategy>,
    pub outcome: CommitOutcome,
}

impl CommitAttempt {
    pub fn success(&self) -> bool {
        self.outcome == CommitOutcome::Sent
    }

    pub fn error(&self) -> Option<ComposerError> {
        match self.outcome {
            CommitOutcome::Sent | CommitOutcome::Cancelled => None,
            CommitOutcome::Exhausted => Some(ComposerError::CommitExhausted {
                attempted: self.strategies.len(),
            }),
            CommitOutcome::ControlMissing => {
                Some(ComposerError::ResolutionFailure("host input control"))
            }
        }
    }
}

#[derive(Debug)]
pub enum CommitPoll {
    Pending { wake_at_ms: u64 },
    Done(CommitAttempt),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Prepare,
    Escalate { next: usize },
    Verify,
    Finished,
}

#[derive(Debug)]
pub struct CommitTask {
    text: String,
    strategies: Vec<CommitStrategy>,
    tried: Vec<CommitStrategy>,
    stage: Stage,
    wake_at_ms: u64,
    was_suppressed: bool,
    /// The control has been seen holding `text`.
    landed: bool,
}

impl CommitTask {
    pub fn new(text: impl Into<String>, strategies: Vec<CommitStrategy>) -> Self {
        Self {
            text: text.into(),
            strategies,
            tried: Vec::new(),
            stage: Stage::Prepare,
            wake_at_ms: 0,
            was_suppressed: false,
            landed: false,
        }
    }

    /// `keep_hidden` is whether the overlay still wants the host control
    /// hidden right now. It is read when the attempt finishes, so a mode
    /// switch during the hand-off is honoured.
    pub fn poll<H: HostDom + ?Sized>(
        &mut self,
        now_ms: u64,
        host: &mut H,
        locator: &HostLocator,
        keep_hidden: bool,
    ) -> CommitPoll {
        if self.stage == Stage::Finished {
            return CommitPoll::Done(self.attempt(CommitOutcome::Cancelled));
        }
        if now_ms < self.wake_at_ms {
            return CommitPoll::Pending {
                wake_at_ms: self.wake_at_ms,
            };
        }

        loop {
            match self.stage {
                Stage::Prepare => {
                    let Some(control) = locator.resolve_input(host) else {
                        tracing::debug!("commit aborted: input control not found");
                        return self.finish(host, locator, CommitOutcome::ControlMissing, keep_hidden);
                    };
                    self.was_suppressed = host.is_suppressed(control);
                    if self.was_suppressed {
                        host.set_suppressed(control, false);
                    }
                    self.write_and_notify(host, control);
                    self.stage = Stage::Escalate { next: 0 };
                    return self.pause(now_ms, CommitStrategy::WriteAndNotify);
                }
                Stage::Escalate { next } => {
                    if self.host_consumed(host, locator) {
                        self.stage = Stage::Verify;
                        continue;
                    }
                    let Some(&strategy) = self.strategies.get(next) else {
                        self.stage = Stage::Verify;
                        continue;
                    };
                    self.stage = Stage::Escalate { next: next + 1 };
                    self.trigger(host, locator, strategy);
                    return self.pause(now_ms, strategy);
                }
                Stage::Verify => {
                    let outcome = if self.host_consumed(host, locator) {
                        CommitOutcome::Sent
                    } else {
                        CommitOutcome::Exhausted
                    };
                    return self.finish(host, locator, outcome, keep_hidden);
                }
                Stage::Finished => return CommitPoll::Done(self.attempt(CommitOutcome::Cancelled)),
            }
        }
    }

    /// Abandon the pipeline between stages, putting the host control back the
    /// way it was found.
    pub fn cancel<H: HostDom + ?Sized>(
        &mut self,
        host: &mut H,
        locator: &HostLocator,
        keep_hidden: bool,
    ) -> CommitAttempt {
        if self.stage == Stage::Finished {
            return self.attempt(CommitOutcome::Cancelled);
        }
        tracing::debug!(tried = self.tried.len(), "commit cancelled");
        match self.finish(host, locator, CommitOutcome::Cancelled, keep_hidden) {
            CommitPoll::Done(attempt) => attempt,
            CommitPoll::Pending { .. } => self.attempt(CommitOutcome::Cancelled),
        }
    }

    fn write_and_notify<H: HostDom + ?Sized>(&mut self, host: &mut H, control: ElementId) {
        if let Err(err) = host.write_value_native(control, &self.text) {
            tracing::debug!(%err, "native write ignored; escalating anyway");
        }
        host.dispatch(control, SyntheticEvent::Input);
        host.dispatch(control, SyntheticEvent::Change);
        self.landed = host.value(control).as_deref() == Some(self.text.as_str());
        self.tried.push(CommitStrategy::WriteAndNotify);
    }

    fn trigger<H: HostDom + ?Sized>(
        &mut self,
        host: &mut H,
        locator: &HostLocator,
        strategy: CommitStrategy,
    ) {
        tracing::debug!(?strategy, "trying submit strategy");
        self.tried.push(strategy);
        if let Some(press) = strategy.enter_press() {
            if let Some(control) = locator.resolve_input(host) {
                host.dispatch(control, SyntheticEvent::EnterDown(press));
                host.dispatch(control, SyntheticEvent::EnterUp(press));
            }
            return;
        }
        match locator.resolve_submit(host) {
            Some(button) => host.click(button),
            None => tracing::debug!("no enabled submit control to click"),
        }
    }

    /// The host took the text once its control, having held it, no longer
    /// does. A control that cannot be found, or never received the write,
    /// proves nothing.
    fn host_consumed<H: HostDom + ?Sized>(&mut self, host: &H, locator: &HostLocator) -> bool {
        let value = locator
            .resolve_input(host)
            .and_then(|control| host.value(control));
        match value {
            Some(v) if v == self.text => {
                self.landed = true;
                false
            }
            Some(_) => self.landed,
            None => false,
        }
    }

    fn pause(&mut self, now_ms: u64, strategy: CommitStrategy) -> CommitPoll {
        self.wake_at_ms = now_ms.saturating_add(strategy.pause_ms());
        CommitPoll::Pending {
            wake_at_ms: self.wake_at_ms,
        }
    }

    fn finish<H: HostDom + ?Sized>(
        &mut self,
        host: &mut H,
        locator: &HostLocator,
        outcome: CommitOutcome,
        keep_hidden: bool,
    ) -> CommitPoll {
        let hide = keep_hidden && (self.was_suppressed || outcome == CommitOutcome::Sent);
        if hide {
            if let Some(control) = locator.resolve_input(host) {
                host.set_suppressed(control, true);
            }
        }
        self.stage = Stage::Finished;
        CommitPoll::Done(self.attempt(outcome))
    }

    fn attempt(&self, outcome: CommitOutcome) -> CommitAttempt {
        CommitAttempt {
            text: self.text.clone(),
            strategies: self.tried.clone(),
            outcome,
        }
    }
}
