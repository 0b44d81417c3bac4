//! Interactive console: this thread reads input and renders state, the backend thread
//! performs the requests.

use std::{
    io::{self, BufRead},
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Result};
use client_core::ClientSettings;
use crossbeam_channel::{bounded, select, Receiver, Sender};

use crate::backend_bridge::{commands::BackendCommand, runtime};
use crate::controller::{
    events::{UiError, UiErrorContext, UiEvent},
    orchestration::dispatch_backend_command,
    reducer::ConsoleState,
};

const COMMAND_QUEUE_DEPTH: usize = 16;
const EVENT_QUEUE_DEPTH: usize = 64;
const TICK: Duration = Duration::from_millis(200);

const HELP: &str = "commands: ring | unlock | history | more | photo <path> | status | help | quit";

enum Action {
    Dispatch(Option<BackendCommand>, UiErrorContext),
    Continue,
    Quit,
}

pub fn run(settings: ClientSettings, confirm_unlock: bool) -> Result<()> {
    let (cmd_tx, cmd_rx) = bounded(COMMAND_QUEUE_DEPTH);
    let (ui_tx, ui_rx) = bounded(EVENT_QUEUE_DEPTH);
    let mut state = ConsoleState::new(settings.history_page_size);
    let backend = runtime::launch(settings, cmd_rx, ui_tx);
    let input_rx = spawn_stdin_reader();

    println!("{HELP}");
    loop {
        let keep_going = select! {
            recv(input_rx) -> line => match line {
                Ok(line) => on_input(&mut state, &cmd_tx, &line, confirm_unlock),
                Err(_) => false,
            },
            recv(ui_rx) -> event => match event {
                Ok(event) => {
                    state.apply(event, Instant::now());
                    true
                }
                Err(_) => false,
            },
            default(TICK) => true,
        };
        if !keep_going {
            break;
        }
        state.tick(Instant::now());
        render(&mut state);
        if state.is_stopped() {
            break;
        }
    }

    // The backend drains whatever is queued, shuts the service down, then exits.
    let _ = cmd_tx.send(BackendCommand::Shutdown);
    drop(cmd_tx);
    while let Ok(event) = ui_rx.recv() {
        state.apply(event, Instant::now());
        render(&mut state);
    }
    backend
        .join()
        .map_err(|_| anyhow!("backend worker panicked"))?;
    Ok(())
}

/// Returns false when the user asked to quit.
fn on_input(
    state: &mut ConsoleState,
    cmd_tx: &Sender<BackendCommand>,
    line: &str,
    confirm_unlock: bool,
) -> bool {
    match handle_input(state, line, confirm_unlock) {
        Action::Dispatch(Some(cmd), context) => {
            if let Err(message) = dispatch_backend_command(cmd_tx, cmd) {
                state.apply(
                    UiEvent::Error(UiError::from_message(context, message)),
                    Instant::now(),
                );
            }
            true
        }
        Action::Dispatch(None, _) | Action::Continue => true,
        Action::Quit => false,
    }
}

fn handle_input(state: &mut ConsoleState, line: &str, confirm_unlock: bool) -> Action {
    if state.is_awaiting_confirmation() {
        return Action::Dispatch(state.answer_confirmation(line), UiErrorContext::Unlock);
    }

    let mut parts = line.split_whitespace();
    match parts.next() {
        None => Action::Continue,
        Some("ring") => Action::Dispatch(state.begin_ring(), UiErrorContext::Ring),
        Some("unlock") => Action::Dispatch(state.begin_unlock(confirm_unlock), UiErrorContext::Unlock),
        Some("history" | "more") => {
            Action::Dispatch(state.begin_history_page(), UiErrorContext::History)
        }
        Some("photo") => match parts.next() {
            Some(path) => Action::Dispatch(
                state.begin_save_photo(PathBuf::from(path)),
                UiErrorContext::Photo,
            ),
            None => {
                println!("usage: photo <path>");
                Action::Continue
            }
        },
        Some("status") => {
            println!("[{}]", state.status());
            Action::Continue
        }
        Some("help") => {
            println!("{HELP}");
            Action::Continue
        }
        Some("quit" | "exit") => Action::Quit,
        Some(other) => {
            println!("unknown command '{other}'; {HELP}");
            Action::Continue
        }
    }
}

fn render(state: &mut ConsoleState) {
    for line in state.drain_output() {
        println!("{line}");
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = bounded(COMMAND_QUEUE_DEPTH);
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
