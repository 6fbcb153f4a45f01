mod actions;
pub mod channel;
pub mod command;
pub mod contacts;
mod core;
pub mod error;
pub mod files;
pub mod i18n;
mod logging;
pub mod notifications;
pub mod providers;
mod state;
pub mod transactions;
mod updates;
pub mod wallet;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use flume::{Receiver, Sender};

pub use actions::AppAction;
pub use channel::{ChannelMessage, ChannelTransport, MemoryChannel};
pub use command::{Command, CommandClient, CommandReply, CommandResult};
pub use crate::core::{AppCore, HttpCommandClient};
pub use error::{ChannelError, CommandError, PrefsError};
pub use logging::init_logging;
pub use state::*;
pub use updates::*;

/// Receives every published snapshot, in order, on a dedicated thread.
pub trait AppReconciler: Send + Sync + 'static {
    fn reconcile(&self, update: AppUpdate);
}

/// Handle to the app actor. Cheap to share; every method returns without
/// waiting for the actor.
pub struct DriveApp {
    core_tx: Sender<CoreMsg>,
    update_rx: Receiver<AppUpdate>,
    listening: AtomicBool,
    shared_state: Arc<RwLock<AppState>>,
}

impl DriveApp {
    pub fn new(data_dir: String) -> Arc<Self> {
        Self::start(data_dir, None)
    }

    /// Same as `new`, with commands going to `client` instead of HTTP.
    pub fn with_command_client(data_dir: String, client: Arc<dyn CommandClient>) -> Arc<Self> {
        Self::start(data_dir, Some(client))
    }

    fn start(data_dir: String, client: Option<Arc<dyn CommandClient>>) -> Arc<Self> {
        logging::init_logging(&data_dir);
        tracing::info!(data_dir = %data_dir, "DriveApp::new() starting");

        let (update_tx, update_rx) = flume::unbounded();
        let (core_tx, core_rx) = flume::unbounded::<CoreMsg>();
        let shared_state = Arc::new(RwLock::new(AppState::empty()));

        // Actor loop thread (single threaded "app actor").
        let core_tx_for_core = core_tx.clone();
        let shared_for_core = shared_state.clone();
        thread::spawn(move || {
            let mut core = AppCore::new(
                update_tx,
                core_tx_for_core,
                data_dir,
                shared_for_core,
                client,
            );
            while let Ok(msg) = core_rx.recv() {
                core.handle_message(msg);
            }
        });

        Arc::new(Self {
            core_tx,
            update_rx,
            listening: AtomicBool::new(false),
            shared_state,
        })
    }

    pub fn state(&self) -> AppState {
        match self.shared_state.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    pub fn dispatch(&self, action: AppAction) {
        // Contract: never block caller.
        let _ = self.core_tx.send(CoreMsg::Action(action));
    }

    /// Inbound push from a transport the caller drives itself.
    pub fn deliver(&self, msg: ChannelMessage) {
        let _ = self.core_tx.send(CoreMsg::Channel(msg));
    }

    /// Subscribe the configured topic on `transport`. Ignored while a live
    /// channel is attached.
    pub fn attach_channel(&self, transport: Box<dyn ChannelTransport>) {
        let _ = self.core_tx.send(CoreMsg::AttachChannel(transport));
    }

    pub fn listen_for_updates(&self, reconciler: Box<dyn AppReconciler>) {
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Avoid multiple listeners that would split messages.
            return;
        }

        let rx = self.update_rx.clone();
        thread::spawn(move || {
            while let Ok(update) = rx.recv() {
                reconciler.reconcile(update);
            }
        });
    }
}
