mod commands;
mod config;
mod http;
mod prefs_db;
mod router;

use std::sync::{Arc, RwLock};

use flume::Sender;
use rusqlite::Connection;

use crate::actions::AppAction;
use crate::channel::ChannelTransport;
use crate::command::{Command, CommandClient};
use crate::i18n::keys;
use crate::state::{AppState, Toast, ToastLevel};
use crate::updates::{AppUpdate, CoreMsg, InternalEvent};

pub use http::HttpCommandClient;

/// Single-threaded owner of all reconciled state. Every `CoreMsg` runs to
/// completion before the next one is taken off the queue.
pub struct AppCore {
    pub state: AppState,
    rev: u64,

    update_sender: Sender<AppUpdate>,
    core_sender: Sender<CoreMsg>,
    shared_state: Arc<RwLock<AppState>>,

    data_dir: String,
    config: config::AppConfig,
    runtime: tokio::runtime::Runtime,
    commands: Arc<dyn CommandClient>,
    prefs: Option<Connection>,

    channel: Option<Box<dyn ChannelTransport>>,
    /// Bumped on every attach and close; pushes from an older attachment
    /// are dropped.
    channel_epoch: u64,
    toast_dismiss_token: u64,
}

impl AppCore {
    pub fn new(
        update_sender: Sender<AppUpdate>,
        core_sender: Sender<CoreMsg>,
        data_dir: String,
        shared_state: Arc<RwLock<AppState>>,
        commands: Option<Arc<dyn CommandClient>>,
    ) -> Self {
        let config = config::load_app_config(&data_dir);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .enable_io()
            .build()
            .expect("tokio runtime");

        let commands = commands.unwrap_or_else(|| {
            let base_url = config.api_base_url();
            tracing::info!(%base_url, "using http command client");
            Arc::new(HttpCommandClient::new(base_url))
        });

        let prefs = match prefs_db::open_prefs_db(&data_dir) {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::warn!(%e, "failed to open preferences db");
                None
            }
        };

        let mut state = AppState::empty();
        state.notification_page_size = config.notification_page_size();
        if let Some(conn) = prefs.as_ref() {
            state
                .providers
                .restore_defaults(prefs_db::load_default_providers(conn));
            state.files.do_not_show_remove_warning =
                prefs_db::load_flag(conn, prefs_db::DO_NOT_SHOW_FILE_REMOVE_WARNING);
            if let Some(view) = prefs_db::load_setting(conn, prefs_db::FILE_LIST_VIEW_TYPE) {
                state.preferences.file_list_view_type = view;
            }
            if let Some(language) = prefs_db::load_setting(conn, prefs_db::LANGUAGE) {
                state.preferences.language = language;
            }
        }

        let this = Self {
            state,
            rev: 0,
            update_sender,
            core_sender,
            shared_state,
            data_dir,
            config,
            runtime,
            commands,
            prefs,
            channel: None,
            channel_epoch: 0,
            toast_dismiss_token: 0,
        };
        this.commit_state_snapshot(&this.state);
        this
    }

    pub fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn next_rev(&mut self) -> u64 {
        self.rev += 1;
        self.state.rev = self.rev;
        self.rev
    }

    fn commit_state_snapshot(&self, snapshot: &AppState) {
        match self.shared_state.write() {
            Ok(mut g) => *g = snapshot.clone(),
            Err(poison) => *poison.into_inner() = snapshot.clone(),
        }
    }

    fn emit_state(&mut self) {
        self.next_rev();
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        let _ = self.update_sender.send(AppUpdate::FullState(snapshot));
    }

    /// Error toast with the fixed title; emits.
    fn toast_error(&mut self, body_key: &str, params: &[(&str, &str)]) {
        let toast = Toast {
            title: self.state.tr(keys::ERROR_TITLE, &[]),
            body: self.state.tr(body_key, params),
            level: ToastLevel::Error,
        };
        tracing::info!(body = %toast.body, "toast");
        self.state.toast = Some(toast);
        self.toast_dismiss_token = self.toast_dismiss_token.saturating_add(1);
        self.schedule_toast_auto_dismiss(self.toast_dismiss_token);
        self.emit_state();
    }

    fn toast_unknown_error(&mut self) {
        self.toast_error(keys::UNKNOWN_ERROR, &[]);
    }

    fn schedule_toast_auto_dismiss(&self, token: u64) {
        let tx = self.core_sender.clone();
        let after = self.config.toast_dismiss_after();
        self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(CoreMsg::Internal(Box::new(
                InternalEvent::ToastAutoDismiss { token },
            )));
        });
    }

    fn handle_toast_auto_dismiss(&mut self, token: u64) {
        if token != self.toast_dismiss_token {
            return;
        }
        if self.state.toast.is_some() {
            self.state.toast = None;
            self.emit_state();
        }
    }

    pub fn handle_message(&mut self, msg: CoreMsg) {
        match msg {
            CoreMsg::Action(action) => {
                // Tag only: payloads carry addresses and search terms.
                tracing::info!(action = action.tag(), "dispatch");
                self.handle_action(action);
            }
            CoreMsg::Channel(msg) => self.handle_channel_message(msg),
            CoreMsg::ChannelPush { epoch, msg } => {
                if epoch != self.channel_epoch || self.channel.is_none() {
                    tracing::debug!(epoch, kind = %msg.kind, "push from detached channel, dropping");
                    return;
                }
                self.handle_channel_message(msg)
            }
            CoreMsg::AttachChannel(transport) => self.attach_channel(transport),
            CoreMsg::Internal(internal) => self.handle_internal(*internal),
        }
    }

    fn handle_internal(&mut self, internal: InternalEvent) {
        match internal {
            InternalEvent::CommandFinished { command, result } => {
                self.handle_command_finished(command, result)
            }
            InternalEvent::ToastAutoDismiss { token } => self.handle_toast_auto_dismiss(token),
        }
    }

    fn attach_channel(&mut self, mut transport: Box<dyn ChannelTransport>) {
        if self.channel.as_ref().is_some_and(|c| !c.is_closed()) {
            tracing::info!("channel already attached, ignoring");
            return;
        }
        self.channel_epoch += 1;
        let epoch = self.channel_epoch;
        let topic = self.config.channel_topic().to_string();
        let tx = self.core_sender.clone();
        transport.subscribe(
            &topic,
            Box::new(move |msg| {
                let _ = tx.send(CoreMsg::ChannelPush { epoch, msg });
            }),
        );
        tracing::info!(%topic, epoch, "channel attached");
        self.channel = Some(transport);
    }

    fn close_channel(&mut self) {
        self.channel_epoch += 1;
        if let Some(mut channel) = self.channel.take() {
            channel.close();
            tracing::info!("channel closed");
        }
    }

    fn handle_action(&mut self, action: AppAction) {
        match action {
            // Session
            AppAction::SetIdentity { address } => {
                let address = address.trim().to_string();
                if address.is_empty() {
                    return;
                }
                self.state.wallet.current_address = Some(address);
                self.state.wallet.authenticated = true;
                self.emit_state();
            }
            AppAction::Logout => {
                self.close_channel();
                self.state.reset_session();
                self.emit_state();
                self.issue(Command::Logout);
            }

            // Files
            AppAction::SetActiveCategory { category } => {
                self.state.files.set_category(category);
                self.emit_state();
            }
            AppAction::SetSearchTerm { term } => {
                self.state.files.set_search_term(term);
                self.emit_state();
            }
            AppAction::LoadFiles => self.load_files(),
            AppAction::ShareFile { file_id, addresses } => {
                self.issue(Command::ShareFile { file_id, addresses })
            }
            AppAction::UnshareFile { file_id, addresses } => {
                self.issue(Command::UnshareFile { file_id, addresses })
            }
            AppAction::SendSignRequest { file_id, addresses } => {
                self.issue(Command::SendSignRequest { file_id, addresses })
            }
            AppAction::SignFile { file_hash } => {
                self.hold_sign_locks(&file_hash);
                self.emit_state();
                self.issue(Command::SignFile { file_hash });
            }
            AppAction::RemoveFile { file_id } => self.issue(Command::RemoveFile { file_id }),
            AppAction::RemoveFileLocal { file_id } => {
                self.issue(Command::RemoveFileLocal { file_id })
            }
            AppAction::SetDoNotShowFileRemoveWarning { value } => {
                self.state.files.do_not_show_remove_warning = value;
                if let Some(conn) = self.prefs.as_ref() {
                    prefs_db::save_flag(conn, prefs_db::DO_NOT_SHOW_FILE_REMOVE_WARNING, value);
                }
                self.emit_state();
            }
            AppAction::CloseShareProcess => {
                if self.state.files.process_info.take().is_some() {
                    self.emit_state();
                }
            }

            // Notifications
            AppAction::SetNotificationSearchTerm { term } => {
                self.state.notifications.search_term = term;
                self.emit_state();
            }
            AppAction::SetShowPending { value } => {
                self.state.notifications.show_pending = value;
                self.emit_state();
            }
            AppAction::HoldNotificationAction { id, action } => {
                if self.state.notifications.hold_action(&id, &action) {
                    self.emit_state();
                }
            }
            AppAction::ReleaseNotificationAction { file_hash, kind } => {
                if self.state.notifications.release_for_file(&file_hash, &kind) {
                    self.emit_state();
                }
            }
            AppAction::UpdateNotification {
                id,
                unread,
                pending,
            } => {
                let Some(existing) = self.state.notifications.get(&id) else {
                    tracing::debug!(%id, "update for unknown notification");
                    return;
                };
                let mut notification = existing.clone();
                notification.unread = unread.unwrap_or(notification.unread);
                notification.pending = pending.unwrap_or(notification.pending);
                self.issue(Command::UpdateNotification { notification });
            }
            AppAction::UpdateFilteredNotifications { unread, pending } => {
                let updated: Vec<_> = self
                    .state
                    .filtered_notifications()
                    .into_iter()
                    .map(|n| {
                        let mut n = n.clone();
                        n.unread = unread.unwrap_or(n.unread);
                        n.pending = pending.unwrap_or(n.pending);
                        n
                    })
                    .collect();
                for notification in updated {
                    self.issue(Command::UpdateNotification { notification });
                }
            }
            AppAction::MarkAllNotificationsRead => self.issue(Command::MarkAllNotificationsRead),
            AppAction::DeleteNotification { id } => {
                self.issue(Command::DeleteNotification { id })
            }

            // Contacts
            AppAction::LoadContacts => self.issue(Command::LoadContacts),
            AppAction::AddContact { name, address } => {
                self.issue(Command::AddContact { name, address })
            }
            AppAction::UpdateContactName { address, name } => {
                self.issue(Command::UpdateContact { address, name })
            }
            AppAction::RemoveContact { address } => {
                self.issue(Command::RemoveContact { address })
            }

            // Storage providers
            AppAction::LoadStorageProviders => self.issue(Command::LoadStorageProviders),
            AppAction::SetDefaultStorageProvider { address } => {
                let Some(identity) = self.state.self_address().map(str::to_string) else {
                    tracing::debug!("default provider needs an identity");
                    return;
                };
                self.state.providers.set_default(&identity, &address);
                if let Some(conn) = self.prefs.as_ref() {
                    prefs_db::save_default_provider(conn, &identity, &address);
                }
                self.emit_state();
            }

            // Wallet
            AppAction::ApproveXes { xes_value } => {
                self.state.wallet.approving = true;
                self.emit_state();
                self.issue(Command::ApproveXes { xes_value });
            }

            // Preferences
            AppAction::SetFileListViewType { view } => {
                if let Some(conn) = self.prefs.as_ref() {
                    prefs_db::save_setting(conn, prefs_db::FILE_LIST_VIEW_TYPE, &view);
                }
                self.state.preferences.file_list_view_type = view;
                self.emit_state();
            }
            AppAction::SetLanguage { language } => {
                if let Some(conn) = self.prefs.as_ref() {
                    prefs_db::save_setting(conn, prefs_db::LANGUAGE, &language);
                }
                self.state.preferences.language = language;
                self.emit_state();
            }

            // UI
            AppAction::ClearToast => {
                if self.state.toast.take().is_some() {
                    self.emit_state();
                }
            }
        }
    }

    /// Clear the list and ask the authority to push the current query.
    fn load_files(&mut self) {
        self.state.files.clear();
        self.state.files.loading = true;
        self.state.files.loading_error = false;
        self.emit_state();
        self.issue(Command::ListFiles {
            context: self.state.files.context().clone(),
        });
    }

    fn hold_sign_locks(&mut self, file_hash: &str) {
        let store = &mut self.state.notifications;
        store.hold_signing_request(file_hash);
        let ids: Vec<String> = store
            .notifications()
            .iter()
            .filter(|n| n.kind == "signing_request" && n.file_hash() == Some(file_hash))
            .map(|n| n.id.clone())
            .collect();
        for id in ids {
            store.hold_action(&id, "sign");
        }
    }

    fn release_sign_locks(&mut self, file_hash: &str) {
        let store = &mut self.state.notifications;
        store.release_signing_request(file_hash);
        store.release_for_file(file_hash, "signing_request");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelMessage, MemoryChannel};
    use crate::command::{CommandReply, CommandResult};
    use crate::error::CommandError;
    use crate::files::FileCategory;
    use futures::future::BoxFuture;
    use futures::FutureExt;

    /// Never completes; completions are fed in by hand.
    struct Idle;

    impl CommandClient for Idle {
        fn execute(&self, _command: Command) -> BoxFuture<'static, CommandResult> {
            futures::future::pending().boxed()
        }
    }

    fn core(dir: &tempfile::TempDir) -> AppCore {
        let (update_tx, _update_rx) = flume::unbounded();
        let (core_tx, _core_rx) = flume::unbounded();
        AppCore::new(
            update_tx,
            core_tx,
            dir.path().to_string_lossy().to_string(),
            Arc::new(RwLock::new(AppState::empty())),
            Some(Arc::new(Idle)),
        )
    }

    fn finish(core: &mut AppCore, command: Command, result: CommandResult) {
        core.handle_message(CoreMsg::Internal(Box::new(
            InternalEvent::CommandFinished { command, result },
        )));
    }

    #[test]
    fn superseded_list_completion_leaves_current_load_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core(&dir);

        core.handle_message(CoreMsg::Action(AppAction::LoadFiles));
        let stale = core.state.files.context().clone();
        core.handle_message(CoreMsg::Action(AppAction::SetActiveCategory {
            category: FileCategory::MyFiles,
        }));
        core.handle_message(CoreMsg::Action(AppAction::LoadFiles));

        finish(
            &mut core,
            Command::ListFiles { context: stale },
            Err(CommandError::Transport("reset".into())),
        );
        assert!(core.state.files.loading);
        assert!(!core.state.files.loading_error);

        let current = core.state.files.context().clone();
        finish(
            &mut core,
            Command::ListFiles { context: current },
            Ok(CommandReply::Done),
        );
        assert!(!core.state.files.loading);
        assert!(!core.state.files.loading_error);
    }

    #[test]
    fn push_from_closed_attachment_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core(&dir);
        let msg = || {
            ChannelMessage::new(
                "connectionStatus",
                serde_json::json!({ "status": "connected" }),
            )
        };

        core.handle_message(CoreMsg::AttachChannel(Box::new(MemoryChannel::new())));
        let epoch = core.channel_epoch;
        core.close_channel();
        core.handle_message(CoreMsg::ChannelPush { epoch, msg: msg() });
        assert_eq!(core.state.wallet.connection_status, "starting");

        core.handle_message(CoreMsg::AttachChannel(Box::new(MemoryChannel::new())));
        core.handle_message(CoreMsg::ChannelPush { epoch, msg: msg() });
        assert_eq!(core.state.wallet.connection_status, "starting");

        let epoch = core.channel_epoch;
        core.handle_message(CoreMsg::ChannelPush { epoch, msg: msg() });
        assert_eq!(core.state.wallet.connection_status, "connected");
    }
}
