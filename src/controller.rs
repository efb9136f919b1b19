//! Playback controller: the single active session and its state machine.
//!
//! The controller owns one swappable session slot. Selecting an entry always
//! releases the previous output session before the new one is opened, so at
//! most one output resource is alive at a time. Output notifications arrive as
//! [`OutputEvent`]s, drained by [`PlaybackController::pump`] together with the
//! fixed-interval position poll.
//!
//! ```text
//! Idle --select--> Preparing --Prepared--> Ready(Playing) <--toggle--> Ready(Paused)
//!   ^                  |                        |                          ^
//!   +----Failed--------+                        +--------Completed---------+
//!   +------------------- select / stop / removal of the active entry ------+
//! ```

use crate::catalog::{CatalogEntry, EntryId};
use crate::error::PlayerError;
use crate::output::{AudioOutput, OutputEvent, OutputSession};
use crate::poller::PositionPoller;
use log::{debug, error, info};
use std::time::{Duration, Instant};

pub const DEFAULT_SKIP_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Preparing,
    Ready(Transport),
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Preparing => "Preparing",
            PlaybackState::Ready(Transport::Playing) => "Playing",
            PlaybackState::Ready(Transport::Paused) => "Paused",
        }
    }
}

/// Transport state of the loaded entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSession {
    pub entry: CatalogEntry,
    pub is_playing: bool,
    pub position_ms: u64,
    /// Zero until the output reports the source as prepared, and also when the
    /// output cannot determine the length.
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub poll_interval: Duration,
    pub skip_interval_ms: u64,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            skip_interval_ms: DEFAULT_SKIP_INTERVAL_MS,
        }
    }
}

struct ActiveSession<S> {
    output: S,
    session: PlaybackSession,
}

pub struct PlaybackController<O: AudioOutput> {
    output: O,
    active: Option<ActiveSession<O::Session>>,
    state: PlaybackState,
    poller: PositionPoller,
    skip_interval_ms: u64,
    last_error: Option<PlayerError>,
}

impl<O: AudioOutput> PlaybackController<O> {
    pub fn new(output: O, options: ControllerOptions) -> Self {
        let mut poller = PositionPoller::new(options.poll_interval);
        poller.start(Instant::now());

        Self {
            output,
            active: None,
            state: PlaybackState::Idle,
            poller,
            skip_interval_ms: options.skip_interval_ms,
            last_error: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.active.as_ref().map(|active| &active.session)
    }

    pub fn active_entry_id(&self) -> Option<EntryId> {
        self.session().map(|session| session.entry.id)
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Ready(Transport::Playing)
    }

    pub fn poller(&self) -> &PositionPoller {
        &self.poller
    }

    pub fn skip_interval_ms(&self) -> u64 {
        self.skip_interval_ms
    }

    /// The most recent failure, kept until the next selection.
    pub fn last_error(&self) -> Option<&PlayerError> {
        self.last_error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<PlayerError> {
        self.last_error.take()
    }

    /// Loads `entry`, replacing whatever was loaded before. Playback starts
    /// automatically once the output reports the source as prepared.
    pub fn select(&mut self, entry: &CatalogEntry) -> Result<(), PlayerError> {
        self.release_active();
        self.last_error = None;
        self.state = PlaybackState::Preparing;
        info!("Preparing {:?} (entry {})", entry.display_name, entry.id);

        match self.output.open(&entry.source, &entry.display_name) {
            Ok(output) => {
                self.active = Some(ActiveSession {
                    output,
                    session: PlaybackSession {
                        entry: entry.clone(),
                        is_playing: false,
                        position_ms: 0,
                        duration_ms: 0,
                    },
                });
                Ok(())
            }
            Err(e) => {
                error!("Failed to open {:?}: {e}", entry.display_name);
                self.state = PlaybackState::Idle;
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Unloads the current entry, if any.
    pub fn stop(&mut self) {
        if self.active.is_some() {
            info!("Playback stopped");
        }
        self.release_active();
    }

    fn release_active(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.output.release();
            debug!("Released output for {:?}", active.session.entry.display_name);
        }
        self.state = PlaybackState::Idle;
    }

    pub fn toggle_play_pause(&mut self) {
        let Some(active) = self.active.as_mut() else {
            debug!("Play/pause ignored: nothing loaded");
            return;
        };

        match self.state {
            PlaybackState::Ready(Transport::Playing) => {
                active.output.pause();
                active.session.position_ms =
                    clamp_position(active.output.position_ms(), active.session.duration_ms);
                active.session.is_playing = false;
                self.state = PlaybackState::Ready(Transport::Paused);
                info!("Paused at {} ms", active.session.position_ms);
            }
            PlaybackState::Ready(Transport::Paused) => {
                active.output.start();
                active.session.is_playing = true;
                self.state = PlaybackState::Ready(Transport::Playing);
                info!("Resumed at {} ms", active.session.position_ms);
            }
            state => debug!("Play/pause ignored while {}", state.label()),
        }
    }

    /// Jumps to an absolute offset, clamped to `[0, duration]`.
    pub fn seek(&mut self, target_ms: i64) {
        if !matches!(self.state, PlaybackState::Ready(_)) {
            debug!("Seek ignored while {}", self.state.label());
            return;
        }
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let duration_ms = active.session.duration_ms;
        if duration_ms == 0 {
            debug!("Seek ignored: duration unknown");
            return;
        }

        let clamped = target_ms.clamp(0, duration_ms as i64) as u64;
        active.session.position_ms = clamped;
        active.output.seek_to(clamped);
        debug!("Seek to {clamped} ms (requested {target_ms} ms)");
    }

    /// Seeks relative to the output's current offset.
    pub fn skip(&mut self, delta_ms: i64) {
        let current = match (&self.state, self.active.as_ref()) {
            (PlaybackState::Ready(_), Some(active)) => {
                clamp_position(active.output.position_ms(), active.session.duration_ms)
            }
            _ => {
                debug!("Skip ignored while {}", self.state.label());
                return;
            }
        };
        self.seek(current as i64 + delta_ms);
    }

    pub fn skip_forward(&mut self) {
        self.skip(self.skip_interval_ms as i64);
    }

    pub fn skip_back(&mut self) {
        self.skip(-(self.skip_interval_ms as i64));
    }

    /// Applies a notification from the active output session.
    pub fn handle_event(&mut self, event: OutputEvent) {
        match event {
            OutputEvent::Prepared { duration_ms } => {
                let Some(active) = self.active.as_mut() else {
                    return;
                };
                if self.state != PlaybackState::Preparing {
                    debug!("Ignoring late prepared notification");
                    return;
                }
                active.session.duration_ms = duration_ms;
                active.session.is_playing = true;
                active.output.start();
                self.state = PlaybackState::Ready(Transport::Playing);
                info!(
                    "Playing {:?} ({duration_ms} ms)",
                    active.session.entry.display_name
                );
            }
            OutputEvent::Completed => self.on_natural_completion(),
            OutputEvent::Failed(reason) => {
                let Some(name) = self
                    .active
                    .as_ref()
                    .map(|active| active.session.entry.display_name.clone())
                else {
                    return;
                };
                let e = PlayerError::source_unavailable(name, reason);
                error!("{e}");
                self.release_active();
                self.last_error = Some(e);
            }
        }
    }

    /// End of media: rewind and pause. Never loops or advances.
    pub fn on_natural_completion(&mut self) {
        if !matches!(self.state, PlaybackState::Ready(_)) {
            return;
        }
        let Some(active) = self.active.as_mut() else {
            return;
        };

        active.output.pause();
        active.output.seek_to(0);
        active.session.position_ms = 0;
        active.session.is_playing = false;
        self.state = PlaybackState::Ready(Transport::Paused);
        info!("Finished {:?}", active.session.entry.display_name);
    }

    /// Copies the output's offset into the session while playing.
    pub fn tick(&mut self) {
        if self.state != PlaybackState::Ready(Transport::Playing) {
            return;
        }
        if let Some(active) = self.active.as_mut() {
            active.session.position_ms =
                clamp_position(active.output.position_ms(), active.session.duration_ms);
        }
    }

    /// Drains pending output notifications and runs the position poll when due.
    pub fn pump(&mut self, now: Instant) {
        while let Some(event) = self.active.as_mut().and_then(|a| a.output.poll_event()) {
            self.handle_event(event);
        }

        if self.poller.due(now) {
            self.tick();
        }
    }

    /// Stops playback when the removed catalog entry is the one loaded.
    pub fn on_entry_removed(&mut self, id: EntryId) {
        if self.active_entry_id() == Some(id) {
            info!("Active entry {id} removed from catalog");
            self.stop();
        }
    }

    /// Releases the output session and cancels the position poll.
    pub fn shutdown(&mut self) {
        self.release_active();
        self.poller.cancel();
    }
}

impl<O: AudioOutput> Drop for PlaybackController<O> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Positions are clamped to the duration only once the duration is known.
fn clamp_position(position_ms: u64, duration_ms: u64) -> u64 {
    if duration_ms == 0 {
        position_ms
    } else {
        position_ms.min(duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AudioSource, Catalog};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Shared {
        log: Rc<RefCell<Vec<String>>>,
        playhead: Rc<Cell<u64>>,
    }

    struct FakeOutput {
        shared: Shared,
        duration_ms: u64,
        fail_open: bool,
        fail_prepare: bool,
    }

    struct FakeSession {
        name: String,
        shared: Shared,
        events: VecDeque<OutputEvent>,
        released: bool,
    }

    impl AudioOutput for FakeOutput {
        type Session = FakeSession;

        fn open(&mut self, _source: &AudioSource, name: &str) -> Result<FakeSession, PlayerError> {
            if self.fail_open {
                return Err(PlayerError::source_unavailable(name, "not found"));
            }
            self.shared.log.borrow_mut().push(format!("open {name}"));
            self.shared.playhead.set(0);
            let event = if self.fail_prepare {
                OutputEvent::Failed("corrupt header".to_string())
            } else {
                OutputEvent::Prepared {
                    duration_ms: self.duration_ms,
                }
            };
            Ok(FakeSession {
                name: name.to_string(),
                shared: self.shared.clone(),
                events: VecDeque::from([event]),
                released: false,
            })
        }
    }

    impl OutputSession for FakeSession {
        fn start(&mut self) {
            self.shared.log.borrow_mut().push(format!("start {}", self.name));
        }

        fn pause(&mut self) {
            self.shared.log.borrow_mut().push(format!("pause {}", self.name));
        }

        fn seek_to(&mut self, position_ms: u64) {
            self.shared.playhead.set(position_ms);
            self.shared
                .log
                .borrow_mut()
                .push(format!("seek {} {position_ms}", self.name));
        }

        fn position_ms(&self) -> u64 {
            self.shared.playhead.get()
        }

        fn poll_event(&mut self) -> Option<OutputEvent> {
            self.events.pop_front()
        }

        fn release(&mut self) {
            assert!(!self.released, "session released twice");
            self.released = true;
            self.shared.log.borrow_mut().push(format!("release {}", self.name));
        }
    }

    fn fake(duration_ms: u64) -> (FakeOutput, Shared) {
        let shared = Shared::default();
        (
            FakeOutput {
                shared: shared.clone(),
                duration_ms,
                fail_open: false,
                fail_prepare: false,
            },
            shared,
        )
    }

    fn ready_controller(duration_ms: u64) -> (PlaybackController<FakeOutput>, Shared, Catalog) {
        let (output, shared) = fake(duration_ms);
        let mut controller = PlaybackController::new(output, ControllerOptions::default());
        let catalog = Catalog::with_bundled();
        controller.select(&catalog.list_entries()[0]).unwrap();
        controller.pump(Instant::now());
        (controller, shared, catalog)
    }

    #[test]
    fn test_new_controller_is_idle() {
        let (output, _) = fake(1_000);
        let controller = PlaybackController::new(output, ControllerOptions::default());
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(controller.session().is_none());
        assert!(controller.poller().is_active());
    }

    #[test]
    fn test_select_prepares_then_autostarts() {
        let (output, shared) = fake(90_000);
        let mut controller = PlaybackController::new(output, ControllerOptions::default());
        let catalog = Catalog::with_bundled();

        controller.select(&catalog.list_entries()[1]).unwrap();
        assert_eq!(controller.state(), PlaybackState::Preparing);
        assert_eq!(controller.session().unwrap().duration_ms, 0);

        controller.pump(Instant::now());
        assert_eq!(controller.state(), PlaybackState::Ready(Transport::Playing));
        let session = controller.session().unwrap();
        assert_eq!(session.duration_ms, 90_000);
        assert!(session.is_playing);
        assert_eq!(
            *shared.log.borrow(),
            vec!["open Sample 2".to_string(), "start Sample 2".to_string()]
        );
    }

    #[test]
    fn test_transport_ignored_while_preparing() {
        let (output, shared) = fake(90_000);
        let mut controller = PlaybackController::new(output, ControllerOptions::default());
        let catalog = Catalog::with_bundled();
        controller.select(&catalog.list_entries()[0]).unwrap();

        controller.toggle_play_pause();
        controller.skip_forward();
        controller.seek(5_000);

        assert_eq!(controller.state(), PlaybackState::Preparing);
        assert_eq!(shared.log.borrow().len(), 1);
    }

    #[test]
    fn test_reselect_releases_previous_once_before_open() {
        let (mut controller, shared, catalog) = ready_controller(60_000);
        controller.select(&catalog.list_entries()[1]).unwrap();

        let log = shared.log.borrow();
        assert_eq!(
            *log,
            vec![
                "open Sample 1".to_string(),
                "start Sample 1".to_string(),
                "release Sample 1".to_string(),
                "open Sample 2".to_string(),
            ]
        );
    }

    #[test]
    fn test_toggle_play_pause() {
        let (mut controller, _, _) = ready_controller(60_000);

        controller.toggle_play_pause();
        assert_eq!(controller.state(), PlaybackState::Ready(Transport::Paused));
        assert!(!controller.session().unwrap().is_playing);

        controller.toggle_play_pause();
        assert_eq!(controller.state(), PlaybackState::Ready(Transport::Playing));
        assert!(controller.session().unwrap().is_playing);
    }

    #[test]
    fn test_toggle_in_idle_is_noop() {
        let (output, shared) = fake(60_000);
        let mut controller = PlaybackController::new(output, ControllerOptions::default());
        controller.toggle_play_pause();
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(shared.log.borrow().is_empty());
    }

    #[test]
    fn test_seek_clamps_to_bounds() {
        let (mut controller, shared, _) = ready_controller(60_000);

        controller.seek(90_000);
        assert_eq!(controller.session().unwrap().position_ms, 60_000);
        assert_eq!(shared.playhead.get(), 60_000);

        controller.seek(-5_000);
        assert_eq!(controller.session().unwrap().position_ms, 0);
        assert_eq!(shared.playhead.get(), 0);

        controller.seek(12_345);
        assert_eq!(controller.session().unwrap().position_ms, 12_345);
    }

    #[test]
    fn test_seek_ignored_when_duration_unknown() {
        let (mut controller, shared, _) = ready_controller(0);
        controller.seek(5_000);
        assert_eq!(controller.session().unwrap().position_ms, 0);
        assert!(!shared.log.borrow().iter().any(|l| l.starts_with("seek")));
    }

    #[test]
    fn test_skip_round_trip() {
        let (mut controller, _, _) = ready_controller(120_000);
        controller.seek(30_000);

        controller.skip_forward();
        assert_eq!(controller.session().unwrap().position_ms, 40_000);
        controller.skip_back();
        assert_eq!(controller.session().unwrap().position_ms, 30_000);
    }

    #[test]
    fn test_skip_clamps_at_both_ends() {
        let (mut controller, _, _) = ready_controller(25_000);

        controller.skip_back();
        assert_eq!(controller.session().unwrap().position_ms, 0);

        controller.seek(20_000);
        controller.skip_forward();
        assert_eq!(controller.session().unwrap().position_ms, 25_000);
        assert_eq!(controller.state(), PlaybackState::Ready(Transport::Playing));
    }

    #[test]
    fn test_skip_uses_output_position() {
        let (mut controller, shared, _) = ready_controller(120_000);
        shared.playhead.set(45_500);

        controller.skip_forward();
        assert_eq!(controller.session().unwrap().position_ms, 55_500);
    }

    #[test]
    fn test_custom_skip_interval() {
        let (output, _) = fake(120_000);
        let options = ControllerOptions {
            skip_interval_ms: 5_000,
            ..Default::default()
        };
        let mut controller = PlaybackController::new(output, options);
        let catalog = Catalog::with_bundled();
        controller.select(&catalog.list_entries()[0]).unwrap();
        controller.pump(Instant::now());

        controller.skip_forward();
        assert_eq!(controller.session().unwrap().position_ms, 5_000);
    }

    #[test]
    fn test_natural_completion_rewinds_and_pauses() {
        let (mut controller, shared, _) = ready_controller(60_000);
        controller.seek(59_000);

        controller.handle_event(OutputEvent::Completed);

        let session = controller.session().unwrap();
        assert_eq!(session.position_ms, 0);
        assert!(!session.is_playing);
        assert_eq!(controller.state(), PlaybackState::Ready(Transport::Paused));
        assert_eq!(shared.playhead.get(), 0);
    }

    #[test]
    fn test_natural_completion_while_paused() {
        let (mut controller, _, _) = ready_controller(60_000);
        controller.seek(10_000);
        controller.toggle_play_pause();

        controller.on_natural_completion();
        assert_eq!(controller.session().unwrap().position_ms, 0);
        assert_eq!(controller.state(), PlaybackState::Ready(Transport::Paused));
    }

    #[test]
    fn test_tick_reads_position_only_while_playing() {
        let (mut controller, shared, _) = ready_controller(60_000);

        shared.playhead.set(3_000);
        controller.tick();
        assert_eq!(controller.session().unwrap().position_ms, 3_000);

        controller.toggle_play_pause();
        shared.playhead.set(9_000);
        controller.tick();
        assert_eq!(controller.session().unwrap().position_ms, 3_000);
    }

    #[test]
    fn test_tick_clamps_to_duration() {
        let (mut controller, shared, _) = ready_controller(60_000);
        shared.playhead.set(61_000);
        controller.tick();
        assert_eq!(controller.session().unwrap().position_ms, 60_000);
    }

    #[test]
    fn test_pump_polls_on_interval() {
        let (output, shared) = fake(60_000);
        let mut controller = PlaybackController::new(output, ControllerOptions::default());
        let catalog = Catalog::with_bundled();
        controller.select(&catalog.list_entries()[0]).unwrap();

        let now = Instant::now();
        controller.pump(now);
        shared.playhead.set(1_500);

        controller.pump(now + Duration::from_secs(5));
        assert_eq!(controller.session().unwrap().position_ms, 1_500);
    }

    #[test]
    fn test_open_failure_reverts_to_idle() {
        let (mut output, shared) = fake(60_000);
        output.fail_open = true;
        let mut controller = PlaybackController::new(output, ControllerOptions::default());
        let mut catalog = Catalog::with_bundled();
        let id = catalog.add_external(PathBuf::from("/missing.mp3"), "missing.mp3");

        let result = controller.select(catalog.get(id).unwrap());
        assert!(matches!(result, Err(PlayerError::SourceUnavailable { .. })));
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(controller.session().is_none());
        assert!(controller.last_error().is_some());
        assert!(shared.log.borrow().is_empty());
    }

    #[test]
    fn test_prepare_failure_reverts_to_idle() {
        let (mut output, shared) = fake(60_000);
        output.fail_prepare = true;
        let mut controller = PlaybackController::new(output, ControllerOptions::default());
        let catalog = Catalog::with_bundled();

        controller.select(&catalog.list_entries()[0]).unwrap();
        controller.pump(Instant::now());

        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(
            controller.take_error(),
            Some(PlayerError::source_unavailable("Sample 1", "corrupt header"))
        );
        assert!(controller.last_error().is_none());
        assert_eq!(
            *shared.log.borrow(),
            vec!["open Sample 1".to_string(), "release Sample 1".to_string()]
        );
    }

    #[test]
    fn test_failed_select_clears_previous_session() {
        let (mut controller, shared, mut catalog) = ready_controller(60_000);
        let id = catalog.add_external(PathBuf::from("/missing.mp3"), "missing.mp3");
        controller.output.fail_open = true;

        assert!(controller.select(catalog.get(id).unwrap()).is_err());
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(
            shared
                .log
                .borrow()
                .contains(&"release Sample 1".to_string())
        );
    }

    #[test]
    fn test_removing_other_entry_keeps_session() {
        let (mut controller, _, mut catalog) = ready_controller(60_000);
        let other = catalog.add_external(PathBuf::from("/a.wav"), "a.wav");

        controller.on_entry_removed(other);
        assert_eq!(controller.state(), PlaybackState::Ready(Transport::Playing));
    }

    #[test]
    fn test_removing_active_entry_stops() {
        let (mut controller, shared, catalog) = ready_controller(60_000);
        let active = catalog.list_entries()[0].id;

        controller.on_entry_removed(active);
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(controller.session().is_none());
        assert_eq!(shared.log.borrow().last().unwrap(), "release Sample 1");
    }

    #[test]
    fn test_shutdown_releases_and_cancels_poller() {
        let (mut controller, shared, _) = ready_controller(60_000);
        controller.shutdown();

        assert!(!controller.poller().is_active());
        assert_eq!(controller.state(), PlaybackState::Idle);

        // Dropping after an explicit shutdown must not release again.
        drop(controller);
        let releases = shared
            .log
            .borrow()
            .iter()
            .filter(|l| l.starts_with("release"))
            .count();
        assert_eq!(releases, 1);
    }

    #[test]
    fn test_drop_releases_session() {
        let (controller, shared, _) = ready_controller(60_000);
        drop(controller);
        assert_eq!(shared.log.borrow().last().unwrap(), "release Sample 1");
    }
}
