//! Sync Engine: the single writer of the message log.
//!
//! Relay callbacks and `submit` calls are both turned into [`EngineCommand`]s
//! and applied one at a time by a worker task, in arrival order. The worker
//! owns the relay; teardown unregisters every handler before disconnecting,
//! so nothing fires against a log that is already gone.

use std::sync::Arc;

use chrono::Local;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::common::events::{
    EVENT_CONNECT, EVENT_DISCONNECT, EVENT_MESSAGE, EVENT_PREVIOUS_MESSAGES,
};
use crate::common::{EngineCommand, EngineState, Message, RelayEvent, Sender};
use crate::error::{DecodeError, NotifyError};
use crate::network::{MessageCodec, Relay};

use super::message_log::MessageLog;
use super::policy::{ForegroundProbe, Notifier, should_notify};

/// Cloneable view of a running engine for the presentation layer.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
    log: watch::Receiver<Vec<Message>>,
    state: watch::Receiver<EngineState>,
}

impl EngineHandle {
    /// Blank text is ignored here and never reaches the worker.
    pub fn submit(&self, text: &str) {
        if text.trim().is_empty() {
            log::debug!("Ignoring blank submit");
            return;
        }
        if self
            .commands
            .send(EngineCommand::Submit(text.to_string()))
            .is_err()
        {
            log::warn!("Sync engine stopped; dropping outgoing message");
        }
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.log.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.log.clone()
    }

    pub fn connection_state(&self) -> EngineState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<EngineState> {
        self.state.clone()
    }
}

pub struct SyncEngine {
    handle: EngineHandle,
    worker: Option<JoinHandle<()>>,
}

impl SyncEngine {
    /// Spawns the worker, which registers relay handlers and connects.
    /// Must be called inside a tokio runtime.
    pub fn start<R: Relay>(
        relay: R,
        codec: MessageCodec,
        foreground: Arc<dyn ForegroundProbe>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (commands, inbox) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(EngineState::Idle);
        let log = MessageLog::new();

        let handle = EngineHandle {
            commands: commands.clone(),
            log: log.subscribe(),
            state: state_rx,
        };
        let worker = Worker {
            relay,
            codec,
            log,
            state: state_tx,
            foreground,
            notifier,
        };

        Self {
            handle,
            worker: Some(tokio::spawn(worker.run(commands, inbox))),
        }
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    pub fn submit(&self, text: &str) {
        self.handle.submit(text);
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.handle.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.handle.subscribe()
    }

    /// Tears the session down and waits for the worker to finish.
    pub async fn shutdown(mut self) {
        let _ = self.handle.commands.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if let Err(err) = worker.await {
                log::error!("Sync engine worker failed: {err}");
            }
        }
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.handle.commands.send(EngineCommand::Shutdown);
        }
    }
}

struct Worker<R> {
    relay: R,
    codec: MessageCodec,
    log: MessageLog,
    state: watch::Sender<EngineState>,
    foreground: Arc<dyn ForegroundProbe>,
    notifier: Arc<dyn Notifier>,
}

impl<R: Relay> Worker<R> {
    async fn run(
        mut self,
        commands: mpsc::UnboundedSender<EngineCommand>,
        mut inbox: mpsc::UnboundedReceiver<EngineCommand>,
    ) {
        self.register_handlers(&commands);
        drop(commands);

        // A relay that never answers leaves us in Connecting: a failed
        // connect produces no event, so only `connect` moves us on.
        self.set_state(EngineState::Connecting);
        self.relay.connect();

        while let Some(command) = inbox.recv().await {
            match command {
                EngineCommand::Relay(event) => self.apply(event),
                EngineCommand::Submit(text) => self.submit(text),
                EngineCommand::Shutdown => break,
            }
        }

        self.teardown();
    }

    fn register_handlers(&mut self, commands: &mpsc::UnboundedSender<EngineCommand>) {
        for name in [
            EVENT_CONNECT,
            EVENT_DISCONNECT,
            EVENT_PREVIOUS_MESSAGES,
            EVENT_MESSAGE,
        ] {
            let commands = commands.clone();
            self.relay.on_event(
                name,
                Box::new(move |payload| {
                    if let Some(event) = RelayEvent::from_wire(name, payload) {
                        let _ = commands.send(EngineCommand::Relay(event));
                    }
                }),
            );
        }
    }

    fn apply(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Connected => self.set_state(EngineState::Connected),
            RelayEvent::Disconnected => {
                // no retry from here; the transport decides
                self.set_state(EngineState::Disconnected);
            }
            RelayEvent::PreviousMessages(payload) => {
                match self.decode_history(payload) {
                    Ok(history) => {
                        log::info!("Relay replayed {} messages", history.len());
                        self.log.replace_all(history);
                    }
                    Err(err) => log::warn!("Dropping `{EVENT_PREVIOUS_MESSAGES}`: {err}"),
                }
            }
            RelayEvent::MessageReceived(payload) => {
                let decoded = payload
                    .ok_or(DecodeError::MissingPayload {
                        event: EVENT_MESSAGE,
                    })
                    .and_then(|raw| self.codec.decode_one(&raw));
                match decoded {
                    Ok(message) => self.receive(message),
                    Err(err) => log::warn!("Dropping `{EVENT_MESSAGE}`: {err}"),
                }
            }
        }
    }

    fn decode_history(&self, payload: Option<Value>) -> Result<Vec<Message>, DecodeError> {
        let raw = payload.ok_or(DecodeError::MissingPayload {
            event: EVENT_PREVIOUS_MESSAGES,
        })?;
        self.codec.decode_many(&raw)
    }

    fn receive(&mut self, message: Message) {
        if self.log.has_local_echo(&message) {
            log::debug!("Relay echoed local message {}", message.id);
            return;
        }

        let notify = should_notify(&message, self.foreground.is_foreground());
        self.log.append(message.clone());
        if notify {
            self.raise(&message);
        }
    }

    fn raise(&self, message: &Message) {
        match self.notifier.raise(message) {
            Ok(()) => log::debug!("Raised notification for message {}", message.id),
            Err(err @ NotifyError::PermissionDenied) => {
                log::info!("Notification for message {} skipped: {err}", message.id);
            }
            Err(err) => log::warn!("Notification for message {} failed: {err}", message.id),
        }
    }

    /// Optimistic local echo: the message is in the log before the relay sees it.
    fn submit(&mut self, text: String) {
        let message = Message {
            id: self.log.len() as i64 + 1,
            text,
            sender: Sender::LocalUser,
            time: Local::now().format("%H:%M").to_string(),
        };

        let envelope = self.codec.encode_outgoing(&message.text, message.sender);
        self.relay.send(EVENT_MESSAGE, envelope);
        self.log.append(message);
    }

    fn teardown(&mut self) {
        self.relay.off_all();
        self.relay.disconnect();
        self.set_state(EngineState::Disconnected);
        log::info!("Sync engine stopped");
    }

    fn set_state(&self, next: EngineState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            log::info!("Sync engine {previous:?} -> {next:?}");
        }
    }
}
