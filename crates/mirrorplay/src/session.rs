//! Tokio driver for a failover controller.
//!
//! A [`PlaybackSession`] owns one [`FailoverController`] on a dedicated task.
//! Signals and viewer actions arrive over a command channel and are applied
//! one at a time; the single load timeout is a `sleep_until` raced against the
//! channel in the task loop. The presentation layer reads the latest
//! [`PlayerView`] from a `watch` channel and may follow transitions through a
//! `broadcast` channel.

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::FailoverConfig;
use crate::controller::{FailoverController, FailoverEvent, PlayerView};
use crate::region::RegionHint;
use crate::source::Content;
use crate::timer::{TimeoutScheduler, TimerToken};
use crate::{Error, Result};

const COMMAND_CHANNEL_CAPACITY: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Scheduler backed by a single tokio deadline.
#[derive(Debug, Default)]
pub struct DeadlineScheduler {
    pending: Option<(TimerToken, Instant)>,
}

impl DeadlineScheduler {
    /// The armed token and when it is due.
    pub fn next_deadline(&self) -> Option<(TimerToken, Instant)> {
        self.pending
    }

    fn take(&mut self, token: TimerToken) {
        if matches!(self.pending, Some((pending, _)) if pending == token) {
            self.pending = None;
        }
    }
}

impl TimeoutScheduler for DeadlineScheduler {
    fn schedule(&mut self, token: TimerToken, after: Duration) {
        self.pending = Some((token, Instant::now() + after));
    }

    fn cancel(&mut self, token: TimerToken) {
        self.take(token);
    }
}

enum Command {
    LoadSucceeded,
    LoadFailed,
    Retry(oneshot::Sender<bool>),
    ToggleSource(oneshot::Sender<bool>),
    ReplaceContent(Content),
    SetRegionHint(RegionHint),
}

/// Entry point for spawning playback sessions.
pub struct PlaybackSession;

impl PlaybackSession {
    /// Run the initial selection and spawn the session task.
    ///
    /// Must be called within a tokio runtime. The initial selection happens
    /// before this returns, so [`SessionHandle::view`] is immediately valid;
    /// events from it are not replayed to later subscribers.
    pub fn spawn(content: Content, hint: RegionHint, config: FailoverConfig) -> SessionHandle {
        let mut controller =
            FailoverController::new(content, hint, config, DeadlineScheduler::default());
        controller.drain_events();

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (view_tx, view_rx) = watch::channel(controller.view());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(
            controller,
            command_rx,
            view_tx,
            event_tx.clone(),
            cancel.clone(),
        ));

        SessionHandle {
            commands: command_tx,
            view: view_rx,
            events: event_tx,
            cancel,
            task: Some(task),
        }
    }
}

/// Handle to a running playback session.
///
/// Dropping the handle stops the session and its pending timer.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<PlayerView>,
    events: broadcast::Sender<FailoverEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Forward the embed surface's "started rendering" signal.
    pub async fn load_succeeded(&self) -> Result<()> {
        self.send(Command::LoadSucceeded).await
    }

    /// Forward the embed surface's error signal.
    pub async fn load_failed(&self) -> Result<()> {
        self.send(Command::LoadFailed).await
    }

    /// Retry from scratch; resolves to whether the retry applied.
    pub async fn retry(&self) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Retry(tx)).await?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Switch to the alternate server; resolves to whether a switch happened.
    pub async fn toggle_source(&self) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::ToggleSource(tx)).await?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Start over with a new content item.
    pub async fn replace_content(&self, content: Content) -> Result<()> {
        self.send(Command::ReplaceContent(content)).await
    }

    /// Deliver a region hint that was computed after the session started.
    pub async fn set_region_hint(&self, hint: RegionHint) -> Result<()> {
        self.send(Command::SetRegionHint(hint)).await
    }

    /// The latest view.
    pub fn view(&self) -> PlayerView {
        self.view.borrow().clone()
    }

    /// A receiver that is notified whenever the view changes.
    pub fn watch(&self) -> watch::Receiver<PlayerView> {
        self.view.clone()
    }

    /// Subscribe to transitions from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<FailoverEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.commands.is_closed()
    }

    /// Stop the session without waiting for its task.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Stop the session and wait for its task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::SessionClosed)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    mut controller: FailoverController<DeadlineScheduler>,
    mut commands: mpsc::Receiver<Command>,
    view: watch::Sender<PlayerView>,
    events: broadcast::Sender<FailoverEvent>,
    cancel: CancellationToken,
) {
    debug!(title = %controller.content().title, "Playback session started");

    loop {
        let deadline = controller.scheduler().next_deadline();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                apply(&mut controller, command);
            }
            token = expire(deadline) => {
                trace!(token = %token, "Load timeout expired");
                controller.scheduler_mut().take(token);
                controller.on_timeout(token);
            }
        }

        publish(&mut controller, &view, &events);
    }

    controller.shutdown();
    debug!(title = %controller.content().title, "Playback session stopped");
}

fn apply(controller: &mut FailoverController<DeadlineScheduler>, command: Command) {
    match command {
        Command::LoadSucceeded => controller.on_load_succeeded(),
        Command::LoadFailed => controller.on_load_failed(),
        Command::Retry(reply) => {
            let _ = reply.send(controller.retry());
        }
        Command::ToggleSource(reply) => {
            let _ = reply.send(controller.toggle_source());
        }
        Command::ReplaceContent(content) => controller.replace_content(content),
        Command::SetRegionHint(hint) => controller.set_region_hint(hint),
    }
}

fn publish(
    controller: &mut FailoverController<DeadlineScheduler>,
    view: &watch::Sender<PlayerView>,
    events: &broadcast::Sender<FailoverEvent>,
) {
    for event in controller.drain_events() {
        // No subscribers is fine.
        let _ = events.send(event);
    }

    let next = controller.view();
    view.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

async fn expire(deadline: Option<(TimerToken, Instant)>) -> TimerToken {
    match deadline {
        Some((token, at)) => {
            tokio::time::sleep_until(at).await;
            token
        }
        None => std::future::pending().await,
    }
}
