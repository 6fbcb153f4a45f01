//! Translation seam.
//!
//! Localization is owned by the presentation layer; the core only needs
//! localized strings for toasts, the synthesized self entry and the
//! notification-type label search. The bundled English catalog is the
//! default when no translator is supplied.

use std::borrow::Cow;

pub trait Translator: Send + Sync {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>>;
}

/// Resolve `key`, falling back to `fallback` (or the key itself), then
/// substitute `{name}` placeholders.
pub fn translate(
    translator: &dyn Translator,
    key: &str,
    fallback: &str,
    params: &[(&str, &str)],
) -> String {
    let template = match translator.lookup(key) {
        Some(t) => t.into_owned(),
        None if !fallback.is_empty() => fallback.to_string(),
        None => key.to_string(),
    };
    interpolate(&template, params)
}

fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in params {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

pub mod keys {
    pub const ERROR_TITLE: &str = "fileJS.transaction_queue.notify.error_title";
    pub const UPLOAD_FAILED: &str = "fileJS.upload.couldNotUpload";
    pub const REMOVE_FAILED: &str = "fileJS.transaction_queue.remove_file.error";
    pub const SIGN_FAILED: &str = "fileJS.transaction_queue.sign_file.error";
    pub const SIGN_REQUEST_FAILED: &str = "fileJS.transaction_queue.sign_request.error";
    pub const SHARE_FAILED: &str = "fileJS.transaction_queue.share_file.error";
    pub const UNSHARE_FAILED: &str = "fileJS.transaction_queue.unshare_file.error";
    pub const UNKNOWN_ERROR: &str = "global.unknownerror";
    pub const CONTACT_EXISTS: &str = "addressbook.contact.alreadyexists";
    pub const MY_ACCOUNT: &str = "addressbook.myWallet";
    pub const XES_FAUCET: &str = "addressbook.contact.xesFaucet";
    pub const STORAGE_PROVIDER: &str = "addressbook.storageProvider";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishCatalog;

impl Translator for EnglishCatalog {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        english(key).map(Cow::Borrowed)
    }
}

fn english(key: &str) -> Option<&'static str> {
    let s = match key {
        keys::ERROR_TITLE => "Error",
        keys::UPLOAD_FAILED => "Could not upload the file to the storage provider",
        keys::REMOVE_FAILED => "{filename} could not be removed.",
        keys::SIGN_FAILED => "{filename} could not be signed.",
        keys::SIGN_REQUEST_FAILED => "Could not send the signing request for {filename}.",
        keys::SHARE_FAILED => "{filename} could not be shared.",
        keys::UNSHARE_FAILED => "Access to {filename} could not be revoked.",
        keys::UNKNOWN_ERROR => "Unknown error",
        keys::CONTACT_EXISTS => "This contact already exists",
        keys::MY_ACCOUNT => "My Account",
        keys::XES_FAUCET => "XES Faucet",
        keys::STORAGE_PROVIDER => "Storage Provider",

        "filebrowser.notifications.notification_signing_request" => "Signing request",
        "filebrowser.notifications.notification_signing_request_desc" => {
            "{who} requested your signature for {fileName}"
        }
        "filebrowser.notifications.notification_signing_request_removed" => {
            "Signing request removed"
        }
        "filebrowser.notifications.notification_signing_request_removed_desc" => {
            "The signing request for {fileName} was withdrawn"
        }
        "filebrowser.notifications.notification_share_request" => "Shared with you",
        "filebrowser.notifications.notification_share_request_desc" => {
            "{from} shared {fileName} with you"
        }
        "filebrowser.notifications.notification_workflow_request" => "Workflow request",
        "filebrowser.notifications.notification_workflow_request_desc" => {
            "{from} sent you a workflow request"
        }
        "filebrowser.notifications.notification_tx_xes_approve" => "XES approval",
        "filebrowser.notifications.notification_tx_xes_approve_desc" => {
            "Approval of {xesAmount} XES confirmed"
        }
        "filebrowser.notifications.notification_tx_register" => "File registered",
        "filebrowser.notifications.notification_tx_register_desc" => {
            "{fileName} was registered on the blockchain"
        }
        "filebrowser.notifications.notification_tx_remove" => "File removed",
        "filebrowser.notifications.notification_tx_remove_desc" => "{fileName} was removed",
        "filebrowser.notifications.notification_tx_share" => "File shared",
        "filebrowser.notifications.notification_tx_share_desc" => {
            "{fileName} was shared with {who}"
        }
        "filebrowser.notifications.notification_tx_sign" => "File signed",
        "filebrowser.notifications.notification_tx_sign_desc" => "You signed {fileName}",
        "filebrowser.notifications.notification_ev_notifysign" => "Signature received",
        "filebrowser.notifications.notification_ev_notifysign_desc" => "{who} signed {fileName}",
        "filebrowser.notifications.notification_tx_signRequest" => "Signature requested",
        "filebrowser.notifications.notification_tx_signRequest_desc" => {
            "A signature for {fileName} was requested from {who}"
        }
        "filebrowser.notifications.notification_tx_revoke" => "Access revoked",
        "filebrowser.notifications.notification_tx_revoke_desc" => {
            "Access to {fileName} was revoked for {who}"
        }
        "filebrowser.notifications.notification_tx_success" => "Transaction successful",
        "filebrowser.notifications.notification_file_about_to_expire" => "File about to expire",
        "filebrowser.notifications.notification_file_about_to_expire_desc" => {
            "{fileName} is about to expire"
        }
        "filebrowser.notifications.notification_file_grace_period" => "File in grace period",
        "filebrowser.notifications.notification_file_grace_period_desc" => {
            "{fileName} entered its grace period"
        }
        "filebrowser.notifications.notification_file_expired" => "File expired",
        "filebrowser.notifications.notification_file_expired_desc" => "{fileName} has expired",
        "filebrowser.notifications.notification_tx_xes_send" => "XES sent",
        "filebrowser.notifications.notification_tx_xes_send_desc" => {
            "{xesAmount} XES sent to {who}"
        }
        "filebrowser.notifications.notification_tx_xes_receive" => "XES received",
        "filebrowser.notifications.notification_tx_xes_receive_desc" => {
            "{xesAmount} XES received from {from}"
        }
        "filebrowser.notifications.notification_tx_eth_increase" => "ETH received",
        "filebrowser.notifications.notification_tx_eth_increase_desc" => {
            "Your ETH balance increased"
        }
        "filebrowser.notifications.notification_tx_eth_decrease" => "ETH spent",
        "filebrowser.notifications.notification_tx_eth_decrease_desc" => {
            "Your ETH balance decreased"
        }
        _ => return None,
    };
    Some(s)
}
