use super::AppCore;

use crate::channel::{ChannelMessage, InboundEvent};
use crate::files::FileApply;
use crate::notifications::Reconcile;
use crate::transactions::{TransactionRecord, TxFailure, TxStatus};

impl AppCore {
    pub(super) fn handle_channel_message(&mut self, msg: ChannelMessage) {
        let event = match InboundEvent::decode(msg) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(%e, "dropping channel message");
                return;
            }
        };
        tracing::debug!(kind = event.tag(), "channel");

        match event {
            InboundEvent::FileInfo { group_key, file } => {
                let id = file.id.clone();
                match self.state.files.accept(group_key.as_deref(), file) {
                    FileApply::Stale => {
                        tracing::trace!(%id, group_key = ?group_key, "stale fileInfo");
                    }
                    FileApply::Inserted | FileApply::Replaced => self.emit_state(),
                }
            }
            InboundEvent::Account(info) => {
                self.state.wallet.apply_account(&info);
                self.emit_state();
            }
            InboundEvent::ConnectionStatus(status) => {
                self.state.wallet.connection_status = status;
                self.emit_state();
            }
            InboundEvent::FileTransfer(tx) | InboundEvent::Transaction(tx) => {
                self.apply_transaction(tx)
            }
            InboundEvent::StorageProvider(provider) => {
                self.state.providers.upsert(provider);
                self.emit_state();
            }
            InboundEvent::AddressBook(entry) => {
                self.state.contacts.upsert(entry);
                self.emit_state();
            }
            InboundEvent::AddSigningRequest(request) => {
                let hash = request.file_hash.clone();
                match self.state.notifications.apply_signing_request(request) {
                    Reconcile::Suppressed => {
                        tracing::debug!(file_hash = %hash, "signing request locked, skipping")
                    }
                    Reconcile::Dismissed => {}
                    Reconcile::Inserted | Reconcile::Replaced => self.emit_state(),
                }
            }
            InboundEvent::RemoveSigningRequest(removal) => {
                let mut changed = false;
                if let Some(hash) = removal.file_hash.as_deref() {
                    changed |= self
                        .state
                        .notifications
                        .remove_signing_request(hash)
                        .is_some();
                }
                if let Some(id) = removal.id.as_deref() {
                    changed |= self.state.notifications.remove_notification(id).is_some();
                }
                if changed {
                    self.emit_state();
                }
            }
            InboundEvent::Notification(notification) => {
                let id = notification.id.clone();
                match self.state.notifications.apply_notification(notification) {
                    Reconcile::Suppressed => {
                        tracing::debug!(%id, "notification locked, skipping")
                    }
                    Reconcile::Dismissed => {}
                    Reconcile::Inserted | Reconcile::Replaced => self.emit_state(),
                }
            }
            InboundEvent::ShareProcess(info) => {
                self.state.files.process_info = Some(info);
                self.emit_state();
            }
            InboundEvent::SessionTimeout => {
                tracing::info!("session timed out, locking");
                self.close_channel();
                self.state.reset_session();
                self.emit_state();
            }
            InboundEvent::Unrecognized { kind } => {
                tracing::debug!(%kind, "unrecognized channel message");
            }
        }
    }

    fn apply_transaction(&mut self, tx: TransactionRecord) {
        let failure = TxFailure::from_tx(&tx);
        let file_hash = tx.hash.clone();

        match (tx.name.as_str(), &tx.status) {
            ("sign", TxStatus::Success) => {
                self.release_sign_locks(&file_hash);
                self.state
                    .notifications
                    .remove_for_file(&file_hash, "signing_request");
            }
            ("sign", TxStatus::Fail) => self.release_sign_locks(&file_hash),
            ("remove", TxStatus::Success) => {
                self.state.files.remove(&file_hash);
            }
            _ => {}
        }

        let outcome = self.state.transactions.apply(tx);
        tracing::debug!(?outcome, "tx applied");

        match failure {
            Some(failure) => {
                let filename = match failure.filename() {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => self.filename_for(&file_hash),
                };
                self.toast_error(failure.body_key(), &[("filename", filename.as_str())]);
            }
            None => self.emit_state(),
        }
    }
}
