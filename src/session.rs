//! Session - one connection to the controller
//!
//! Owns the transport, the registry and the notifier. Inbound messages are
//! applied one at a time from the session loop, so the registry has a single
//! owner and needs no locking.

use anyhow::{Context, Result};
use serde_json::Value;
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::commands::{GlobalQuery, RoomCommand};
use crate::config::{AppConfig, ConfigWatcher};
use crate::feedback::{FeedbackCallback, FeedbackEvaluator};
use crate::notifier::ChangeNotifier;
use crate::osc::{InboundMessage, OscArg};
use crate::router::{Dispatch, Router};
use crate::state::Registry;
use crate::transport::Transport;
use crate::variables::{self, VariableCallback, VariableStore, VariableValues};

/// Capacity of the inbound message channel
const INBOUND_CHANNEL_SIZE: usize = 256;

/// Subscribers attached to every notifier this session builds
#[derive(Clone, Default)]
pub struct SessionHooks {
    pub variables: Vec<VariableCallback>,
    pub feedbacks: Vec<FeedbackCallback>,
}

/// Requests from the interactive console
pub enum SessionRequest {
    /// Raw OSC command
    Send { path: String, args: Vec<OscArg> },
    Room(RoomCommand),
    Query(GlobalQuery),
    /// Apply a message as if it had been received
    Inject(InboundMessage),
    /// Registry as JSON
    Registry(oneshot::Sender<Value>),
    Variables(oneshot::Sender<VariableValues>),
    Feedbacks(oneshot::Sender<Vec<(String, bool)>>),
}

pub struct Session {
    config: AppConfig,
    transport: Transport,
    registry: Registry,
    router: Router,
    notifier: ChangeNotifier,
    hooks: SessionHooks,
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: mpsc::Receiver<InboundMessage>,
}

impl Session {
    /// Open the transport and start with an empty registry
    pub async fn start(config: AppConfig, hooks: SessionHooks) -> Result<Self> {
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_SIZE);
        let transport = open_transport(&config, inbound_tx.clone()).await?;

        let session = Self {
            router: Router::new(&config.device.output_header),
            notifier: build_notifier(&config, &hooks),
            registry: Registry::new(),
            config,
            transport,
            hooks,
            inbound_tx,
            inbound_rx,
        };

        info!(
            "✅ Session started: commands to {}, header {}",
            session.transport.target(),
            session.router.output_header()
        );
        Ok(session)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Number of notification cycles run since the session (re)started
    pub fn notification_cycles(&self) -> u64 {
        self.notifier.cycles()
    }

    /// Route one inbound message and notify observers if it committed a change
    pub fn apply(&mut self, msg: &InboundMessage) -> Dispatch {
        let result = self.router.dispatch(&mut self.registry, msg);
        if result.should_notify() {
            self.notifier.notify(&self.registry);
        }
        result
    }

    /// Fire-and-forget command to the device
    pub fn send(&self, path: &str, args: &[OscArg]) {
        self.transport.send(path, args);
    }

    pub fn send_command(&self, command: &RoomCommand) {
        let msg = command.to_message(self.config.namespace());
        debug!(selector = %command.target, command = %command.command, "Room command");
        self.send(&msg.path, &msg.args);
    }

    pub fn query(&self, query: GlobalQuery) {
        let msg = query.to_message(self.config.namespace());
        self.send(&msg.path, &msg.args);
    }

    /// Current display variables
    pub fn variables(&self) -> VariableValues {
        variables::compute(&self.registry)
    }

    /// Current state of every configured feedback
    pub fn feedbacks(&self) -> Vec<(String, bool)> {
        self.config
            .feedbacks
            .iter()
            .map(|binding| (binding.id.clone(), binding.evaluate(&self.registry)))
            .collect()
    }

    /// Replace the transport and registry for a new configuration
    ///
    /// An invalid configuration is rejected before anything is torn down.
    /// Otherwise the old sockets are closed first, so the listen port can be
    /// reused; messages still queued from them are discarded along with the
    /// old registry. If the new transport cannot be opened the previous
    /// configuration is reopened and the error returned.
    pub async fn reconfigure(&mut self, config: AppConfig) -> Result<()> {
        config.validate().context("Rejected new configuration")?;
        self.transport.close().await;

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_SIZE);
        let transport = match open_transport(&config, inbound_tx.clone()).await {
            Ok(transport) => transport,
            Err(e) => {
                self.reopen_previous().await;
                return Err(e);
            }
        };
        self.transport = transport;
        self.inbound_tx = inbound_tx;
        self.inbound_rx = inbound_rx;

        self.registry = Registry::new();
        self.router = Router::new(&config.device.output_header);
        self.notifier = build_notifier(&config, &self.hooks);
        self.config = config;

        info!(
            "✅ Session reconfigured: commands to {}, header {}",
            self.transport.target(),
            self.router.output_header()
        );
        Ok(())
    }

    async fn reopen_previous(&mut self) {
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_SIZE);
        match open_transport(&self.config, inbound_tx.clone()).await {
            Ok(transport) => {
                self.transport = transport;
                self.inbound_tx = inbound_tx;
                self.inbound_rx = inbound_rx;
                warn!("⚠️  Reopened previous transport to {}", self.transport.target());
            }
            Err(e) => {
                error!("❌ Could not reopen previous transport: {:#}", e);
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.transport.destroy();
        info!("Session closed");
    }

    /// Event loop: inbound telemetry, console requests, config reloads, shutdown
    ///
    /// Returns when the shutdown future resolves or the console hangs up.
    pub async fn run(
        mut self,
        mut requests: Option<mpsc::Receiver<SessionRequest>>,
        mut config_watcher: Option<ConfigWatcher>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        tokio::pin!(shutdown);
        info!("Starting session loop...");

        loop {
            tokio::select! {
                Some(msg) = self.inbound_rx.recv() => {
                    let result = self.apply(&msg);
                    debug!(address = %msg.address, ?result, "Inbound message handled");
                }

                request = next_request(&mut requests) => {
                    match request {
                        Some(request) => self.handle_request(request),
                        None => {
                            info!("Console closed, stopping session loop");
                            break;
                        }
                    }
                }

                Some(new_config) = next_config(&mut config_watcher) => {
                    info!("📝 Configuration file changed, reconnecting...");
                    if let Err(e) = self.reconfigure(new_config).await {
                        warn!("⚠️  Failed to apply new config: {:#}", e);
                        if self.transport.is_destroyed() {
                            error!("❌ Session is send-disabled until a working configuration is loaded");
                        }
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping session loop");
                    break;
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    fn handle_request(&mut self, request: SessionRequest) {
        match request {
            SessionRequest::Send { path, args } => self.send(&path, &args),
            SessionRequest::Room(command) => self.send_command(&command),
            SessionRequest::Query(query) => self.query(query),
            SessionRequest::Inject(msg) => {
                let result = self.apply(&msg);
                info!("Injected {} -> {:?}", msg, result);
            }
            SessionRequest::Registry(reply) => {
                let snapshot = serde_json::to_value(&self.registry).unwrap_or(Value::Null);
                let _ = reply.send(snapshot);
            }
            SessionRequest::Variables(reply) => {
                let _ = reply.send(self.variables());
            }
            SessionRequest::Feedbacks(reply) => {
                let _ = reply.send(self.feedbacks());
            }
        }
    }

    /// Sender feeding the session loop as if messages arrived from the device
    pub fn inbound_sender(&self) -> mpsc::Sender<InboundMessage> {
        self.inbound_tx.clone()
    }
}

async fn open_transport(config: &AppConfig, inbound: mpsc::Sender<InboundMessage>) -> Result<Transport> {
    let target = config.device.command_addr()?;
    let transport = Transport::start(target, config.device.listen_port, inbound)
        .await
        .context("Failed to open OSC transport")?;

    if config.device.listening() && !transport.is_listening() {
        warn!(
            "⚠️  No telemetry on port {}: room state will not update until the port is freed and the config is reloaded",
            config.device.listen_port
        );
    }
    Ok(transport)
}

fn build_notifier(config: &AppConfig, hooks: &SessionHooks) -> ChangeNotifier {
    let mut variables = VariableStore::new();
    for callback in &hooks.variables {
        variables.subscribe(callback.clone());
    }

    let mut feedbacks = FeedbackEvaluator::new(config.feedbacks.clone());
    for callback in &hooks.feedbacks {
        feedbacks.subscribe(callback.clone());
    }

    let mut notifier = ChangeNotifier::new();
    notifier.subscribe(Box::new(variables));
    notifier.subscribe(Box::new(feedbacks));
    debug!(
        observers = notifier.observer_count(),
        variables = crate::variables::variable_definitions().len(),
        feedbacks = config.feedbacks.len(),
        "Change notifier ready"
    );
    notifier
}

async fn next_request(requests: &mut Option<mpsc::Receiver<SessionRequest>>) -> Option<SessionRequest> {
    match requests {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_config(watcher: &mut Option<ConfigWatcher>) -> Option<AppConfig> {
    match watcher {
        Some(w) => w.next_config().await,
        None => std::future::pending().await,
    }
}
