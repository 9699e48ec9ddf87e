//! Frame-paced playback of queued actions.
//!
//! ```text
//!  add_action ──► VecDeque<Action> ──tick()──► ExecuteAction::execute_action
//!       │                                              ▲
//!       └────────── surface hidden: apply now ─────────┘
//! ```
//!
//! [`run_playback`] drives `tick()` from a tokio interval and takes
//! control commands over an mpsc channel.

use std::collections::VecDeque;

use lectern_proto::Action;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::apply::{ExecuteAction, TickReport};
use crate::config::PlaybackConfig;
use crate::executor::ActionExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not started, or stopped; incoming actions are dropped.
    #[default]
    Stopped,
    Running,
    /// Actions accumulate but are not drained by `tick`.
    Suspended,
}

/// FIFO action queue feeding one executor.
pub struct PlaybackScheduler<E: ActionExecutor> {
    executor: E,
    queue: VecDeque<Action>,
    state: PlaybackState,
    visible: bool,
    config: PlaybackConfig,
}

impl<E: ActionExecutor> PlaybackScheduler<E> {
    pub fn new(executor: E, config: PlaybackConfig) -> Self {
        Self {
            executor,
            queue: VecDeque::new(),
            state: PlaybackState::Stopped,
            visible: true,
            config,
        }
    }

    pub fn start(&mut self) {
        if self.state == PlaybackState::Stopped {
            debug!("Playback started");
        }
        self.state = PlaybackState::Running;
    }

    /// Enqueues `action`.
    ///
    /// While the surface is hidden (and `apply_when_hidden` is set) the
    /// queue is drained and the action applied at once, so a hidden
    /// player never falls behind.
    pub fn add_action(&mut self, action: Action) {
        match self.state {
            PlaybackState::Stopped => {
                debug!("Dropped {:?} action: playback stopped", action.action_type());
            }
            PlaybackState::Running if !self.visible && self.config.apply_when_hidden => {
                self.flush();
                self.apply(&action);
            }
            _ => self.queue.push_back(action),
        }
    }

    /// Executes the actions queued when the tick started, oldest first.
    ///
    /// Actions added during the tick wait for the next one.
    pub fn tick(&mut self) -> TickReport {
        if self.state != PlaybackState::Running {
            return TickReport::default();
        }
        let due = self.queue.len();
        self.drain(due)
    }

    /// Executes everything queued, regardless of suspension.
    pub fn flush(&mut self) -> TickReport {
        let due = self.queue.len();
        self.drain(due)
    }

    pub fn suspend(&mut self) {
        if self.state == PlaybackState::Running {
            self.state = PlaybackState::Suspended;
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Suspended {
            self.state = PlaybackState::Running;
        }
    }

    /// Discards queued actions and halts playback until the next `start`.
    pub fn stop(&mut self) {
        if !self.queue.is_empty() {
            info!("Playback stopped, discarding {} queued actions", self.queue.len());
        }
        self.queue.clear();
        self.state = PlaybackState::Stopped;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    fn drain(&mut self, count: usize) -> TickReport {
        let mut report = TickReport::default();
        for _ in 0..count {
            let Some(action) = self.queue.pop_front() else {
                break;
            };
            if self.apply(&action) {
                report.executed += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }

    fn apply(&mut self, action: &Action) -> bool {
        match self.executor.execute_action(action) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Failed to execute {:?} action at {}: {e}",
                    action.action_type(),
                    action.timestamp
                );
                false
            }
        }
    }

    fn apply_command(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::Action(action) => self.add_action(action),
            PlaybackCommand::Suspend => self.suspend(),
            PlaybackCommand::Resume => self.resume(),
            PlaybackCommand::Stop => self.stop(),
            PlaybackCommand::SetVisible(visible) => self.set_visible(visible),
            PlaybackCommand::Flush => {
                self.flush();
            }
            PlaybackCommand::Shutdown => {}
        }
    }
}

/// Control messages for [`run_playback`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    Action(Action),
    Suspend,
    Resume,
    Stop,
    SetVisible(bool),
    Flush,
    /// Flushes the queue and ends the loop.
    Shutdown,
}

/// Ticks `scheduler` every frame interval until `Shutdown` arrives or all
/// senders are dropped; the queue is flushed before the scheduler is
/// handed back.
pub async fn run_playback<E: ActionExecutor>(
    mut scheduler: PlaybackScheduler<E>,
    mut commands: mpsc::Receiver<PlaybackCommand>,
) -> PlaybackScheduler<E> {
    let mut interval = tokio::time::interval(scheduler.config.frame_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    if scheduler.state() == PlaybackState::Stopped {
        scheduler.start();
    }

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = scheduler.tick();
                if report.failed > 0 {
                    debug!("Tick executed {} actions, {} failed", report.executed, report.failed);
                }
            }
            command = commands.recv() => match command {
                Some(PlaybackCommand::Shutdown) | None => break,
                Some(command) => scheduler.apply_command(command),
            }
        }
    }

    let report = scheduler.flush();
    debug!("Playback loop finished, flushed {} actions", report.total());
    scheduler
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::LocalExecutor;
    use lectern_core::{Brush, Document, NullSurface, PenPoint};
    use lectern_proto::{ActionKind, BrushAction};

    fn scheduler() -> PlaybackScheduler<LocalExecutor> {
        let mut executor = LocalExecutor::new(Document::whiteboard(1, 1), Box::new(NullSurface));
        executor.set_page_number(0).unwrap();
        let mut scheduler = PlaybackScheduler::new(executor, PlaybackConfig::for_testing());
        scheduler.start();
        scheduler
    }

    fn stroke(handle: i32) -> Vec<Action> {
        vec![
            Action::new(0, ActionKind::Pen(BrushAction::new(handle, Brush::default()))),
            Action::new(1, ActionKind::ToolBegin(PenPoint::new(0.1, 0.1, 1.0))),
            Action::new(2, ActionKind::ToolEnd(PenPoint::new(0.2, 0.2, 1.0))),
        ]
    }

    fn shape_count(scheduler: &PlaybackScheduler<LocalExecutor>) -> usize {
        scheduler.executor().document().page(0).unwrap().shapes().len()
    }

    #[test]
    fn test_tick_drains_in_order() {
        let mut scheduler = scheduler();
        for action in stroke(1) {
            scheduler.add_action(action);
        }
        assert_eq!(scheduler.len(), 3);
        assert_eq!(shape_count(&scheduler), 0);

        let report = scheduler.tick();
        assert_eq!(report, TickReport { executed: 3, failed: 0 });
        assert!(scheduler.is_empty());
        assert_eq!(shape_count(&scheduler), 1);
    }

    #[test]
    fn test_failure_does_not_halt_drain() {
        let mut scheduler = scheduler();
        scheduler.add_action(Action::new(0, ActionKind::ToolBegin(PenPoint::default())));
        for action in stroke(2) {
            scheduler.add_action(action);
        }
        let report = scheduler.tick();
        assert_eq!(report, TickReport { executed: 3, failed: 1 });
        assert_eq!(shape_count(&scheduler), 1);
    }

    #[test]
    fn test_suspend_and_resume() {
        let mut scheduler = scheduler();
        scheduler.suspend();
        for action in stroke(1) {
            scheduler.add_action(action);
        }
        assert_eq!(scheduler.tick(), TickReport::default());
        assert_eq!(scheduler.len(), 3);

        scheduler.resume();
        assert_eq!(scheduler.tick().executed, 3);
    }

    #[test]
    fn test_stop_clears_and_drops() {
        let mut scheduler = scheduler();
        for action in stroke(1) {
            scheduler.add_action(action);
        }
        scheduler.stop();
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.state(), PlaybackState::Stopped);

        scheduler.add_action(Action::new(0, ActionKind::Undo));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_hidden_surface_applies_immediately() {
        let mut scheduler = scheduler();
        scheduler.add_action(stroke(1).remove(0));
        scheduler.set_visible(false);
        for action in stroke(1).into_iter().skip(1) {
            scheduler.add_action(action);
        }
        assert!(scheduler.is_empty());
        assert_eq!(shape_count(&scheduler), 1);
    }

    #[test]
    fn test_hidden_without_apply_queues() {
        let mut executor = LocalExecutor::new(Document::whiteboard(1, 1), Box::new(NullSurface));
        executor.set_page_number(0).unwrap();
        let config = PlaybackConfig {
            apply_when_hidden: false,
            ..PlaybackConfig::for_testing()
        };
        let mut scheduler = PlaybackScheduler::new(executor, config);
        scheduler.start();
        scheduler.set_visible(false);
        scheduler.add_action(Action::new(0, ActionKind::Undo));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_flush_ignores_suspension() {
        let mut scheduler = scheduler();
        for action in stroke(1) {
            scheduler.add_action(action);
        }
        scheduler.suspend();
        assert_eq!(scheduler.flush().executed, 3);
        assert_eq!(scheduler.state(), PlaybackState::Suspended);
    }

    #[tokio::test]
    async fn test_run_playback_until_shutdown() {
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(run_playback(scheduler(), rx));

        for action in stroke(4) {
            tx.send(PlaybackCommand::Action(action)).await.unwrap();
        }
        tx.send(PlaybackCommand::Shutdown).await.unwrap();

        let scheduler = handle.await.unwrap();
        assert!(scheduler.is_empty());
        assert!(scheduler.executor().document().page(0).unwrap().shape(4).is_some());
    }

    #[tokio::test]
    async fn test_run_playback_ends_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(PlaybackCommand::Suspend).await.unwrap();
        drop(tx);
        let scheduler = run_playback(scheduler(), rx).await;
        assert_eq!(scheduler.state(), PlaybackState::Suspended);
    }
}
