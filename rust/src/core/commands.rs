use super::AppCore;

use crate::command::{Command, CommandReply, CommandResult};
use crate::error::CommandError;
use crate::i18n::keys;
use crate::updates::{CoreMsg, InternalEvent};

impl AppCore {
    /// Run `command` on the core runtime and feed its completion back into
    /// the actor queue. No retries.
    pub(super) fn issue(&self, command: Command) {
        tracing::debug!(command = command.tag(), "issue");
        let tx = self.core_sender.clone();
        if !self.config.network_enabled() {
            let _ = tx.send(CoreMsg::Internal(Box::new(InternalEvent::CommandFinished {
                command,
                result: Err(CommandError::NetworkDisabled),
            })));
            return;
        }
        let fut = self.commands.execute(command.clone());
        self.runtime.spawn(async move {
            let result = fut.await;
            let _ = tx.send(CoreMsg::Internal(Box::new(InternalEvent::CommandFinished {
                command,
                result,
            })));
        });
    }

    fn refresh_files(&mut self) {
        self.load_files();
    }

    /// Display name for a file: its record, then a signing request, then the id.
    pub(super) fn filename_for(&self, file_id: &str) -> String {
        self.state
            .files
            .records()
            .iter()
            .find(|f| f.id == file_id)
            .map(|f| f.filename.clone())
            .or_else(|| {
                self.state
                    .notifications
                    .signing_requests()
                    .iter()
                    .find(|s| s.file_hash == file_id && !s.filename.is_empty())
                    .map(|s| s.filename.clone())
            })
            .unwrap_or_else(|| file_id.to_string())
    }

    fn toast_file_error(&mut self, body_key: &str, file_id: &str) {
        let filename = self.filename_for(file_id);
        self.toast_error(body_key, &[("filename", filename.as_str())]);
    }

    pub(super) fn handle_command_finished(&mut self, command: Command, result: CommandResult) {
        if let Err(ref e) = result {
            tracing::warn!(command = command.tag(), %e, "command failed");
        }
        match (command, result) {
            (Command::ListFiles { context }, result) => {
                if context != *self.state.files.context() {
                    tracing::debug!(group_key = %context.group_key(), "superseded list completion");
                    return;
                }
                self.state.files.loading = false;
                if result.is_err() {
                    self.state.files.loading_error = true;
                }
                self.emit_state();
            }

            (
                Command::ShareFile { .. }
                | Command::UnshareFile { .. }
                | Command::SendSignRequest { .. }
                | Command::RemoveFile { .. },
                Ok(_),
            ) => self.refresh_files(),
            (Command::ShareFile { file_id, .. }, Err(_)) => {
                self.toast_file_error(keys::SHARE_FAILED, &file_id)
            }
            (Command::UnshareFile { file_id, .. }, Err(_)) => {
                self.toast_file_error(keys::UNSHARE_FAILED, &file_id)
            }
            (Command::SendSignRequest { file_id, .. }, Err(_)) => {
                self.toast_file_error(keys::SIGN_REQUEST_FAILED, &file_id)
            }
            (Command::RemoveFile { file_id }, Err(_)) => {
                self.toast_file_error(keys::REMOVE_FAILED, &file_id)
            }

            (Command::RemoveFileLocal { file_id }, Ok(_)) => {
                if self.state.files.remove(&file_id).is_some() {
                    self.emit_state();
                }
            }
            (Command::RemoveFileLocal { file_id }, Err(_)) => {
                self.toast_file_error(keys::REMOVE_FAILED, &file_id)
            }

            // The outcome arrives later as a `tx` push.
            (Command::SignFile { .. }, Ok(_)) => {}
            (Command::SignFile { file_hash }, Err(_)) => {
                self.release_sign_locks(&file_hash);
                self.toast_file_error(keys::SIGN_FAILED, &file_hash);
            }

            (Command::UpdateNotification { notification }, Ok(_)) => {
                self.state.notifications.apply_notification(notification);
                self.emit_state();
            }
            (Command::MarkAllNotificationsRead, Ok(_)) => {
                self.state.notifications.mark_all_read();
                self.emit_state();
            }
            (Command::DeleteNotification { id }, Ok(_)) => {
                if self.state.notifications.remove_notification(&id).is_some() {
                    self.emit_state();
                }
            }
            (
                Command::UpdateNotification { .. }
                | Command::MarkAllNotificationsRead
                | Command::DeleteNotification { .. },
                Err(_),
            ) => self.toast_unknown_error(),

            (Command::LoadContacts, Ok(CommandReply::Contacts(entries))) => {
                self.state.contacts.set_all(entries);
                self.emit_state();
            }
            (
                Command::AddContact { .. }
                | Command::UpdateContact { .. }
                | Command::RemoveContact { .. },
                Ok(_),
            ) => self.issue(Command::LoadContacts),
            (Command::AddContact { .. }, Err(CommandError::Conflict)) => {
                self.toast_error(keys::CONTACT_EXISTS, &[])
            }
            (
                Command::LoadContacts
                | Command::AddContact { .. }
                | Command::UpdateContact { .. }
                | Command::RemoveContact { .. },
                Err(_),
            ) => self.toast_unknown_error(),

            (Command::LoadStorageProviders, Ok(CommandReply::StorageProviders(providers))) => {
                self.state.providers.set_all(providers);
                self.emit_state();
            }
            (Command::LoadStorageProviders, Err(_)) => self.toast_unknown_error(),

            (Command::ApproveXes { .. }, result) => {
                self.state.wallet.approving = false;
                if result.is_err() {
                    self.toast_unknown_error();
                } else {
                    self.emit_state();
                }
            }

            // Local state is already reset.
            (Command::Logout, _) => {}

            (command, Ok(reply)) => {
                tracing::warn!(command = command.tag(), ?reply, "unexpected command reply");
            }
        }
    }
}
