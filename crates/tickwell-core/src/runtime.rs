//! Live session: the engine, registry and persistence on one tokio task.
//!
//! Commands from front ends and tick tickets from the drivers are both
//! received by the session task, so every mutation is serialized without a
//! lock. State is written to the repository after each change and read once
//! when the session is built.

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::audio::{Playback, WhiteNoise, WhiteNoiseRegistry};
use crate::clock::Clock;
use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::notify::{ChannelNotifier, Completion, CompletionNotifier};
use crate::storage::{Config, KvStore, StateRepository};
use crate::timer::{DriverTicket, NewTimer, Timer, TimerEngine, TimerId, TokioDriver};

const COMMAND_BUFFER: usize = 64;
const COMPLETION_BUFFER: usize = 32;

/// A white noise track together with its current volume.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackStatus {
    pub track: WhiteNoise,
    pub volume: f32,
}

enum Command {
    Create {
        request: NewTimer,
        reply: oneshot::Sender<Result<Timer, ValidationError>>,
    },
    Start {
        id: TimerId,
        reply: oneshot::Sender<Option<Event>>,
    },
    Pause {
        id: TimerId,
        reply: oneshot::Sender<Option<Event>>,
    },
    Delete {
        id: TimerId,
        reply: oneshot::Sender<Option<Event>>,
    },
    Timers {
        reply: oneshot::Sender<Vec<Timer>>,
    },
    Tracks {
        reply: oneshot::Sender<Vec<TrackStatus>>,
    },
    ToggleNoise {
        id: String,
        reply: oneshot::Sender<Result<Event>>,
    },
    SetVolume {
        id: String,
        level: f32,
        reply: oneshot::Sender<Result<f32, ValidationError>>,
    },
    Shutdown,
}

enum Input {
    Command(Option<Command>),
    Tick(DriverTicket),
}

pub struct Session<K: KvStore> {
    engine: TimerEngine,
    registry: WhiteNoiseRegistry,
    repo: StateRepository<K>,
    commands: mpsc::Receiver<Command>,
    ticks: mpsc::UnboundedReceiver<DriverTicket>,
    completions: ChannelNotifier,
}

impl<K: KvStore + 'static> Session<K> {
    /// Build a session from stored state.
    ///
    /// Timers stored as running come back paused; no driver is started
    /// until a front end asks for one.
    ///
    /// # Errors
    /// Returns an error if the repository cannot be read.
    pub fn new(
        config: &Config,
        repo: StateRepository<K>,
        clock: impl Clock + 'static,
        playback: impl Playback + 'static,
    ) -> Result<(Self, SessionHandle)> {
        let (tick_tx, ticks) = mpsc::unbounded_channel();
        let (cmd_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (completion_tx, _) = broadcast::channel(COMPLETION_BUFFER);
        let completions = ChannelNotifier::new(completion_tx);

        let driver = TokioDriver::new(tick_tx);
        let mut engine = TimerEngine::new(driver, clock);
        engine.replace_all(repo.load_timers()?);
        engine.subscribe(completions.clone());

        let registry = WhiteNoiseRegistry::new(repo.load_white_noises()?, playback)
            .with_default_volume(config.white_noise.default_volume);

        let session = Self {
            engine,
            registry,
            repo,
            commands,
            ticks,
            completions,
        };
        Ok((session, SessionHandle { tx: cmd_tx }))
    }

    /// Add a completion subscriber in addition to the broadcast channel.
    pub fn subscribe(&mut self, notifier: impl CompletionNotifier + 'static) {
        self.engine.subscribe(notifier);
    }

    /// Receiver for every completion from now on.
    pub fn completions(&self) -> broadcast::Receiver<Completion> {
        self.completions.subscribe()
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands and ticks until shut down or every handle is dropped.
    pub async fn run(mut self) {
        loop {
            let input = tokio::select! {
                cmd = self.commands.recv() => Input::Command(cmd),
                Some(ticket) = self.ticks.recv() => Input::Tick(ticket),
            };
            match input {
                Input::Command(None) | Input::Command(Some(Command::Shutdown)) => break,
                Input::Command(Some(cmd)) => self.handle(cmd),
                Input::Tick(ticket) => {
                    if self.engine.has_driver(&ticket.timer_id) {
                        self.engine.tick(&ticket);
                        self.persist_timers();
                    }
                }
            }
        }
        debug!("session stopped");
        self.registry.stop_all();
        self.persist_timers();
        self.persist_tracks();
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Create { request, reply } => {
                let result = self.engine.create(request);
                if result.is_ok() {
                    self.persist_timers();
                }
                let _ = reply.send(result);
            }
            Command::Start { id, reply } => {
                let event = self.engine.start(&id);
                self.after_change(&event);
                let _ = reply.send(event);
            }
            Command::Pause { id, reply } => {
                let event = self.engine.pause(&id);
                self.after_change(&event);
                let _ = reply.send(event);
            }
            Command::Delete { id, reply } => {
                let event = self.engine.delete(&id);
                self.after_change(&event);
                let _ = reply.send(event);
            }
            Command::Timers { reply } => {
                let _ = reply.send(self.engine.timers().to_vec());
            }
            Command::Tracks { reply } => {
                let _ = reply.send(self.track_statuses());
            }
            Command::ToggleNoise { id, reply } => {
                let result = self.registry.toggle(&id);
                if result.is_ok() {
                    self.persist_tracks();
                }
                let _ = reply.send(result);
            }
            Command::SetVolume { id, level, reply } => {
                let _ = reply.send(self.registry.set_volume(&id, level));
            }
            Command::Shutdown => {}
        }
    }

    fn after_change(&mut self, event: &Option<Event>) {
        if event.is_some() {
            self.persist_timers();
        }
    }

    fn track_statuses(&self) -> Vec<TrackStatus> {
        self.registry
            .tracks()
            .iter()
            .map(|t| TrackStatus {
                track: t.clone(),
                volume: self.registry.volume(&t.id),
            })
            .collect()
    }

    fn persist_timers(&mut self) {
        if let Err(e) = self.repo.save_timers(self.engine.timers()) {
            warn!(error = %e, "failed to persist timers");
        }
    }

    fn persist_tracks(&mut self) {
        if let Err(e) = self.repo.save_white_noises(self.registry.tracks()) {
            warn!(error = %e, "failed to persist white noises");
        }
    }
}

/// Cloneable front-end handle to a running [`Session`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| CoreError::SessionClosed)?;
        rx.await.map_err(|_| CoreError::SessionClosed)
    }

    pub async fn create(&self, request: NewTimer) -> Result<Timer> {
        Ok(self
            .request(|reply| Command::Create { request, reply })
            .await??)
    }

    pub async fn start(&self, id: TimerId) -> Result<Option<Event>> {
        self.request(|reply| Command::Start { id, reply }).await
    }

    pub async fn pause(&self, id: TimerId) -> Result<Option<Event>> {
        self.request(|reply| Command::Pause { id, reply }).await
    }

    pub async fn delete(&self, id: TimerId) -> Result<Option<Event>> {
        self.request(|reply| Command::Delete { id, reply }).await
    }

    pub async fn timers(&self) -> Result<Vec<Timer>> {
        self.request(|reply| Command::Timers { reply }).await
    }

    pub async fn tracks(&self) -> Result<Vec<TrackStatus>> {
        self.request(|reply| Command::Tracks { reply }).await
    }

    pub async fn toggle_white_noise(&self, id: impl Into<String>) -> Result<Event> {
        let id = id.into();
        self.request(|reply| Command::ToggleNoise { id, reply })
            .await?
    }

    pub async fn set_volume(&self, id: impl Into<String>, level: f32) -> Result<f32> {
        let id = id.into();
        Ok(self
            .request(|reply| Command::SetVolume { id, level, reply })
            .await??)
    }

    /// Ask the session to stop. Pending commands queued before this one are
    /// still processed.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| CoreError::SessionClosed)
    }
}
