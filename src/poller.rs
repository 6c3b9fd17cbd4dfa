//! Decides when the renderer process should be up.
//!
//! The renderer is wanted while overlays are enabled, the user is in a game
//! and the host menu is closed. Commands go out on transitions only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::backend::RenderCommands;

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The user's global "Enable" switch, shared between the panel and the
/// poller thread. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct OverlayToggle(Arc<AtomicBool>);

impl OverlayToggle {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, enabled: bool) {
        let previous = self.0.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            tracing::debug!(from = previous, to = enabled, "overlay toggle updated");
        }
    }
}

/// Live state of the host application, queried every tick.
pub trait HostState {
    fn in_game(&self) -> bool;
    fn menu_visible(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderCommand {
    Create,
    Destroy,
}

#[derive(Debug)]
pub struct VisibilityPoller {
    toggle: OverlayToggle,
    shown: bool,
}

impl VisibilityPoller {
    pub fn new(toggle: OverlayToggle) -> Self {
        Self {
            toggle,
            shown: false,
        }
    }

    pub const fn should_show(enabled: bool, in_game: bool, menu_visible: bool) -> bool {
        enabled && in_game && !menu_visible
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Feeds one sample and returns the command due, if the wanted state
    /// changed since the last dispatch.
    pub fn observe(
        &mut self,
        enabled: bool,
        in_game: bool,
        menu_visible: bool,
    ) -> Option<RenderCommand> {
        let wanted = Self::should_show(enabled, in_game, menu_visible);
        if wanted == self.shown {
            return None;
        }
        self.shown = wanted;
        Some(if wanted {
            RenderCommand::Create
        } else {
            RenderCommand::Destroy
        })
    }

    /// One polling step: sample the toggle and host, dispatch on change.
    pub fn tick<H, C>(&mut self, host: &H, commands: &C) -> Option<RenderCommand>
    where
        H: HostState + ?Sized,
        C: RenderCommands + ?Sized,
    {
        let command = self.observe(
            self.toggle.is_enabled(),
            host.in_game(),
            host.menu_visible(),
        )?;
        tracing::debug!(?command, "visibility changed");
        match command {
            RenderCommand::Create => commands.create(),
            RenderCommand::Destroy => commands.destroy(),
        }
        Some(command)
    }

    /// Final teardown: always destroys, whatever was dispatched before.
    pub fn shutdown<C: RenderCommands + ?Sized>(&mut self, commands: &C) {
        self.shown = false;
        commands.destroy();
    }

    /// Runs the poller on its own thread until the handle is stopped or
    /// dropped.
    pub fn spawn<H, C>(mut self, host: H, commands: C, interval: Duration) -> PollerHandle
    where
        H: HostState + Send + 'static,
        C: RenderCommands + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let thread = std::thread::spawn(move || {
            tracing::debug!(?interval, "visibility poller started");
            loop {
                self.tick(&host, &commands);
                commands.supervise();
                match stop_rx.recv_timeout(interval) {
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
            self.shutdown(&commands);
            tracing::debug!("visibility poller stopped");
        });

        PollerHandle {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        }
    }
}

/// Stops the poller thread; the thread issues its final destroy on the way
/// out.
#[derive(Debug)]
pub struct PollerHandle {
    stop_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn stop(mut self) {
        self.shut_down();
    }

    fn shut_down(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("visibility poller thread panicked");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shut_down();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Debug, Default, Clone)]
    struct RecordingCommands {
        issued: Arc<Mutex<Vec<RenderCommand>>>,
    }

    impl RecordingCommands {
        fn issued(&self) -> Vec<RenderCommand> {
            self.issued.lock().unwrap().clone()
        }
    }

    impl RenderCommands for RecordingCommands {
        fn create(&self) {
            self.issued.lock().unwrap().push(RenderCommand::Create);
        }

        fn destroy(&self) {
            self.issued.lock().unwrap().push(RenderCommand::Destroy);
        }
    }

    #[derive(Debug, Default, Clone)]
    struct FakeHost {
        in_game: Arc<AtomicBool>,
        menu_visible: Arc<AtomicBool>,
    }

    impl FakeHost {
        fn set(&self, in_game: bool, menu_visible: bool) {
            self.in_game.store(in_game, Ordering::SeqCst);
            self.menu_visible.store(menu_visible, Ordering::SeqCst);
        }
    }

    impl HostState for FakeHost {
        fn in_game(&self) -> bool {
            self.in_game.load(Ordering::SeqCst)
        }

        fn menu_visible(&self) -> bool {
            self.menu_visible.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn sample_sequence_dispatches_create_then_destroy_once() {
        let toggle = OverlayToggle::new(false);
        let mut poller = VisibilityPoller::new(toggle.clone());
        let host = FakeHost::default();
        let commands = RecordingCommands::default();

        host.set(true, false);
        assert_eq!(poller.tick(&host, &commands), None);

        toggle.set(true);
        assert_eq!(poller.tick(&host, &commands), Some(RenderCommand::Create));

        host.set(true, true);
        assert_eq!(poller.tick(&host, &commands), Some(RenderCommand::Destroy));

        host.set(false, false);
        assert_eq!(poller.tick(&host, &commands), None);

        assert_eq!(
            commands.issued(),
            vec![RenderCommand::Create, RenderCommand::Destroy]
        );
    }

    #[test]
    fn repeated_samples_do_not_repeat_commands() {
        let mut poller = VisibilityPoller::new(OverlayToggle::default());
        assert_eq!(poller.observe(true, true, false), Some(RenderCommand::Create));
        for _ in 0..5 {
            assert_eq!(poller.observe(true, true, false), None);
        }
        assert!(poller.is_shown());
        assert_eq!(poller.observe(false, true, false), Some(RenderCommand::Destroy));
        assert_eq!(poller.observe(false, false, true), None);
    }

    #[test]
    fn shutdown_destroys_even_when_hidden() {
        let mut poller = VisibilityPoller::new(OverlayToggle::default());
        let commands = RecordingCommands::default();

        poller.shutdown(&commands);

        assert_eq!(commands.issued(), vec![RenderCommand::Destroy]);
        assert!(!poller.is_shown());
    }

    #[test]
    fn spawned_poller_reacts_and_destroys_on_stop() {
        let toggle = OverlayToggle::new(true);
        let host = FakeHost::default();
        host.set(true, false);
        let commands = RecordingCommands::default();

        let handle = VisibilityPoller::new(toggle).spawn(
            host.clone(),
            commands.clone(),
            Duration::from_millis(2),
        );

        let deadline = Instant::now() + Duration::from_secs(5);
        while commands.issued().is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        handle.stop();

        assert_eq!(
            commands.issued(),
            vec![RenderCommand::Create, RenderCommand::Destroy]
        );
    }
}
