use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use mkite_conformer::engine::progress::{Progress, ProgressCallback};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::warn;

const EVENT_BUFFER: usize = 4096;

#[derive(Debug)]
pub enum UiEvent {
    Progress(Progress),
    Log(String),
}

/// Renders progress bars and log lines on stderr from a single task, so
/// worker threads never write to the terminal directly.
pub struct UiManager {
    mp: Arc<MultiProgress>,
    state: BarState,
    event_receiver: mpsc::Receiver<UiEvent>,
    shutdown_receiver: watch::Receiver<bool>,
    _sentinel_bar: ProgressBar,
}

#[derive(Default)]
struct BarState {
    active_bar: Option<ProgressBar>,
    base_message: String,
}

impl UiManager {
    pub fn new() -> (Self, mpsc::Sender<UiEvent>, watch::Sender<bool>) {
        let (event_sender, event_receiver) = mpsc::channel(EVENT_BUFFER);
        let (shutdown_sender, shutdown_receiver) = watch::channel(false);
        let mp = Arc::new(MultiProgress::new());
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        let _sentinel_bar = mp.add(ProgressBar::hidden());
        let manager = Self {
            mp,
            state: BarState::default(),
            event_receiver,
            shutdown_receiver,
            _sentinel_bar,
        };

        (manager, event_sender, shutdown_sender)
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(event) = self.event_receiver.recv() => {
                    self.handle_event(event);
                }
                result = self.shutdown_receiver.changed() => {
                    if result.is_err() || *self.shutdown_receiver.borrow() {
                        break;
                    }
                }
            }
        }
        // Flush whatever was queued before the shutdown signal.
        while let Ok(event) = self.event_receiver.try_recv() {
            self.handle_event(event);
        }
        if let Some(bar) = self.state.active_bar.take() {
            bar.finish_and_clear();
        }
        self._sentinel_bar.finish_and_clear();
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Log(msg) => {
                self.mp.println(msg).ok();
            }
            UiEvent::Progress(progress) => self.handle_progress(progress),
        }
    }

    fn handle_progress(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                if let Some(bar) = self.state.active_bar.take() {
                    bar.finish_and_clear();
                }

                let pb = self.mp.add(ProgressBar::new_spinner());
                pb.enable_steady_tick(Duration::from_millis(80));
                pb.set_style(Self::spinner_style());
                pb.set_message(name);

                self.state.active_bar = Some(pb);
                self.state.base_message = name.to_string();
            }
            Progress::PhaseFinish => {
                if let Some(bar) = self.state.active_bar.take() {
                    bar.finish_and_clear();
                }

                let final_message = format!("✓ {}", self.state.base_message);
                self.mp.println(final_message).ok();

                self.state.base_message.clear();
            }
            Progress::TaskStart { total_steps } => {
                if let Some(bar) = self.state.active_bar.as_ref() {
                    bar.disable_steady_tick();
                    bar.set_style(Self::bar_style());
                    bar.set_length(total_steps);
                    bar.set_position(0);
                }
            }
            Progress::TaskIncrement => {
                if let Some(bar) = self.state.active_bar.as_ref() {
                    bar.inc(1);
                }
            }
            Progress::TaskFinish => {
                if let Some(bar) = self.state.active_bar.as_ref() {
                    if let Some(length) = bar.length() {
                        bar.set_position(length);
                    }
                    bar.finish();
                }
            }
            Progress::Message(msg) => {
                self.mp.println(format!("  {}", msg)).ok();
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<20} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("━╸ ")
    }
}

/// Bridges the library's progress callback onto the UI channel.
#[derive(Clone)]
pub struct CliProgressHandler {
    sender: mpsc::Sender<UiEvent>,
}

impl CliProgressHandler {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let sender = self.sender.clone();
        Box::new(move |progress: Progress| {
            if let Err(e) = sender.try_send(UiEvent::Progress(progress)) {
                warn!("Failed to send progress update to UI channel: {}", e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_manager() -> (UiManager, mpsc::Sender<UiEvent>) {
        let (manager, sender, _) = UiManager::new();
        manager.mp.set_draw_target(ProgressDrawTarget::hidden());
        (manager, sender)
    }

    fn start_phase(manager: &mut UiManager, name: &'static str) {
        manager.handle_event(UiEvent::Progress(Progress::PhaseStart { name }));
    }

    #[test]
    fn handle_phase_start_creates_new_spinner() {
        let (mut manager, _) = setup_manager();
        assert!(manager.state.active_bar.is_none());

        start_phase(&mut manager, "Embedding");

        let bar = manager.state.active_bar.as_ref().unwrap();
        assert_eq!(bar.message(), "Embedding");
        assert_eq!(manager.state.base_message, "Embedding");
    }

    #[test]
    fn handle_phase_start_replaces_existing_bar() {
        let (mut manager, _) = setup_manager();
        start_phase(&mut manager, "Embedding");
        start_phase(&mut manager, "Optimization");

        let bar = manager.state.active_bar.as_ref().unwrap();
        assert_eq!(bar.message(), "Optimization");
        assert_eq!(manager.state.base_message, "Optimization");
    }

    #[test]
    fn handle_phase_finish_clears_active_bar() {
        let (mut manager, _) = setup_manager();
        start_phase(&mut manager, "Clustering");

        manager.handle_event(UiEvent::Progress(Progress::PhaseFinish));

        assert!(manager.state.active_bar.is_none());
        assert!(manager.state.base_message.is_empty());
    }

    #[test]
    fn task_events_drive_the_bar() {
        let (mut manager, _) = setup_manager();
        start_phase(&mut manager, "Embedding");

        manager.handle_event(UiEvent::Progress(Progress::TaskStart { total_steps: 20 }));
        {
            let bar = manager.state.active_bar.as_ref().unwrap();
            assert_eq!(bar.length(), Some(20));
            assert_eq!(bar.position(), 0);
        }

        for _ in 0..3 {
            manager.handle_event(UiEvent::Progress(Progress::TaskIncrement));
        }
        assert_eq!(manager.state.active_bar.as_ref().unwrap().position(), 3);

        manager.handle_event(UiEvent::Progress(Progress::TaskFinish));
        let bar = manager.state.active_bar.as_ref().unwrap();
        assert!(bar.is_finished());
        assert_eq!(bar.position(), 20);
    }

    #[test]
    fn task_events_without_a_phase_are_ignored() {
        let (mut manager, _) = setup_manager();
        manager.handle_event(UiEvent::Progress(Progress::TaskStart { total_steps: 5 }));
        manager.handle_event(UiEvent::Progress(Progress::TaskIncrement));
        manager.handle_event(UiEvent::Progress(Progress::TaskFinish));
        assert!(manager.state.active_bar.is_none());
    }

    #[test]
    fn log_and_message_events_print() {
        let (mut manager, _) = setup_manager();
        manager.handle_event(UiEvent::Log("Test log message".to_string()));
        manager.handle_event(UiEvent::Progress(Progress::Message(
            "Test progress message".to_string(),
        )));
    }

    #[tokio::test]
    async fn cli_progress_handler_sends_progress_event() {
        let (sender, mut receiver) = mpsc::channel(1);
        let handler = CliProgressHandler::new(sender);
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Embedding" });

        match receiver.recv().await {
            Some(UiEvent::Progress(Progress::PhaseStart { name })) => {
                assert_eq!(name, "Embedding")
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn manager_exits_on_shutdown() {
        let (manager, sender, shutdown) = UiManager::new();
        manager.mp.set_draw_target(ProgressDrawTarget::hidden());
        let handle = tokio::spawn(manager.run());

        sender
            .send(UiEvent::Log("before shutdown".to_string()))
            .await
            .unwrap();
        shutdown.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("UI manager did not stop")
            .unwrap();
    }
}
