//! Console state and the transitions driven by user actions and backend events.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use client_core::HistoryPager;
use shared::domain::Visit;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// How long the "door unlocked" state is shown before returning to idle.
pub const UNLOCK_RESET_DELAY: Duration = Duration::from_secs(2);

const STATUS_READY: &str = "Ready for the next ring";

#[derive(Debug)]
pub struct ConsoleState {
    status: String,
    backend_ready: bool,
    backend_stopped: bool,
    ringing: bool,
    unlocking: bool,
    awaiting_confirmation: bool,
    current_visit: Option<Visit>,
    unlock_reset_at: Option<Instant>,
    history: HistoryPager,
    output: Vec<String>,
}

impl ConsoleState {
    pub fn new(history_page_size: u32) -> Self {
        Self {
            status: "Starting backend...".to_string(),
            backend_ready: false,
            backend_stopped: false,
            ringing: false,
            unlocking: false,
            awaiting_confirmation: false,
            current_visit: None,
            unlock_reset_at: None,
            history: HistoryPager::new(history_page_size),
            output: Vec::new(),
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn current_visit(&self) -> Option<&Visit> {
        self.current_visit.as_ref()
    }

    pub fn history(&self) -> &HistoryPager {
        &self.history
    }

    pub fn is_stopped(&self) -> bool {
        self.backend_stopped
    }

    pub fn can_ring(&self) -> bool {
        self.backend_ready && !self.ringing
    }

    /// Unlock is offered only while a visitor is shown.
    pub fn can_unlock(&self) -> bool {
        self.backend_ready && self.current_visit.is_some() && !self.unlocking
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        self.awaiting_confirmation
    }

    pub fn begin_ring(&mut self) -> Option<BackendCommand> {
        if !self.can_ring() {
            self.say("Ring is not available right now");
            return None;
        }
        self.ringing = true;
        self.current_visit = None;
        if self.unlock_reset_at.take().is_some() {
            self.unlocking = false;
        }
        self.set_status("Ringing the doorbell...");
        Some(BackendCommand::Ring)
    }

    /// Starts an unlock. With `confirm`, the next input line must confirm it first.
    pub fn begin_unlock(&mut self, confirm: bool) -> Option<BackendCommand> {
        if !self.can_unlock() {
            self.say("No visitor to let in");
            return None;
        }
        if confirm {
            self.awaiting_confirmation = true;
            self.say("Confirm it is you to open the door [y/N]:");
            return None;
        }
        self.start_unlock()
    }

    pub fn answer_confirmation(&mut self, answer: &str) -> Option<BackendCommand> {
        self.awaiting_confirmation = false;
        if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            self.say("Identity confirmed");
            self.start_unlock()
        } else {
            self.say("Confirmation declined; door stays locked");
            None
        }
    }

    pub fn begin_history_page(&mut self) -> Option<BackendCommand> {
        if !self.backend_ready {
            self.say("Backend is not ready yet");
            return None;
        }
        match self.history.next_request() {
            Some((limit, offset)) => Some(BackendCommand::LoadHistoryPage { limit, offset }),
            None if self.history.is_loading() => {
                self.say("History page already loading");
                None
            }
            None => {
                self.say("No more visits");
                None
            }
        }
    }

    pub fn begin_save_photo(&mut self, path: PathBuf) -> Option<BackendCommand> {
        let Some(visit) = self.current_visit.clone() else {
            self.say("No visitor photo to save");
            return None;
        };
        Some(BackendCommand::SavePhoto { visit, path })
    }

    pub fn apply(&mut self, event: UiEvent, now: Instant) {
        match event {
            UiEvent::BackendReady => {
                self.backend_ready = true;
                self.set_status(STATUS_READY);
            }
            UiEvent::BackendStopped => {
                self.backend_ready = false;
                self.backend_stopped = true;
            }
            UiEvent::VisitorArrived(visit) => {
                self.ringing = false;
                self.set_status("Someone is at the door!");
                self.say(describe_visit(&visit));
                self.current_visit = Some(visit);
            }
            UiEvent::DoorUnlocked => {
                self.set_status("Door unlocked!");
                self.unlock_reset_at = Some(now + UNLOCK_RESET_DELAY);
            }
            UiEvent::HistoryPage(visits) => {
                let first = self.history.visits().len();
                self.history.apply_page(visits);
                if self.history.is_empty_history() {
                    self.say("No visits");
                }
                let lines: Vec<String> = self.history.visits()[first..]
                    .iter()
                    .map(describe_visit)
                    .collect();
                for line in lines {
                    self.say(line);
                }
                if first < self.history.visits().len() && !self.history.has_more() {
                    self.say("End of history");
                }
            }
            UiEvent::PhotoSaved {
                visit_id,
                path,
                bytes,
            } => {
                self.say(format!(
                    "Saved photo of visit {} to {} ({bytes} bytes)",
                    visit_id.0,
                    path.display()
                ));
            }
            UiEvent::Error(err) => self.apply_error(err),
        }
    }

    /// Returns to idle once the post-unlock delay has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(reset_at) = self.unlock_reset_at {
            if now >= reset_at {
                self.unlock_reset_at = None;
                self.unlocking = false;
                self.current_visit = None;
                self.set_status(STATUS_READY);
            }
        }
    }

    pub fn drain_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    fn start_unlock(&mut self) -> Option<BackendCommand> {
        self.unlocking = true;
        self.set_status("Opening the door...");
        Some(BackendCommand::Unlock)
    }

    fn apply_error(&mut self, err: UiError) {
        match err.context() {
            UiErrorContext::BackendStartup => {
                self.backend_ready = false;
            }
            UiErrorContext::Ring => self.ringing = false,
            UiErrorContext::Unlock => self.unlocking = false,
            UiErrorContext::History => self.history.apply_error(),
            UiErrorContext::Photo => {}
        }
        match err.context() {
            UiErrorContext::History | UiErrorContext::Photo => {
                self.say(format!("Error: {}", err.message()));
            }
            _ => self.set_status(format!("Error: {}", err.message())),
        }
        if err.requires_api_key_fix() {
            self.say("Check the api_key setting or DOORBELL_API_KEY");
        }
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.output.push(format!("[{}]", self.status));
    }

    fn say(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }
}

pub fn describe_visit(visit: &Visit) -> String {
    let when = visit
        .recorded_at()
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| visit.timestamp.clone());
    match visit.effective_photo_url() {
        Some(url) if !url.is_empty() => format!("#{} at {when}, photo: {url}", visit.id.0),
        _ => format!("#{} at {when}, no photo", visit.id.0),
    }
}
