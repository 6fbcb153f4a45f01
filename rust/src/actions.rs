use crate::files::FileCategory;

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    // Session
    SetIdentity {
        address: String,
    },
    Logout,

    // Files
    SetActiveCategory {
        category: FileCategory,
    },
    SetSearchTerm {
        term: String,
    },
    LoadFiles,
    ShareFile {
        file_id: String,
        addresses: Vec<String>,
    },
    UnshareFile {
        file_id: String,
        addresses: Vec<String>,
    },
    SignFile {
        file_hash: String,
    },
    SendSignRequest {
        file_id: String,
        addresses: Vec<String>,
    },
    RemoveFile {
        file_id: String,
    },
    RemoveFileLocal {
        file_id: String,
    },
    SetDoNotShowFileRemoveWarning {
        value: bool,
    },
    CloseShareProcess,

    // Notifications
    SetNotificationSearchTerm {
        term: String,
    },
    SetShowPending {
        value: bool,
    },
    HoldNotificationAction {
        id: String,
        action: String,
    },
    ReleaseNotificationAction {
        file_hash: String,
        kind: String,
    },
    UpdateNotification {
        id: String,
        unread: Option<bool>,
        pending: Option<bool>,
    },
    UpdateFilteredNotifications {
        unread: Option<bool>,
        pending: Option<bool>,
    },
    MarkAllNotificationsRead,
    DeleteNotification {
        id: String,
    },

    // Contacts
    LoadContacts,
    AddContact {
        name: String,
        address: String,
    },
    UpdateContactName {
        address: String,
        name: String,
    },
    RemoveContact {
        address: String,
    },

    // Storage providers
    LoadStorageProviders,
    SetDefaultStorageProvider {
        address: String,
    },

    // Wallet
    /// Approve `xes_value` XES for the storage contract.
    ApproveXes {
        xes_value: String,
    },

    // Preferences
    SetFileListViewType {
        view: String,
    },
    SetLanguage {
        language: String,
    },

    // UI
    ClearToast,
}

impl AppAction {
    /// Log-safe action tag.
    pub fn tag(&self) -> &'static str {
        match self {
            // Session
            AppAction::SetIdentity { .. } => "SetIdentity",
            AppAction::Logout => "Logout",

            // Files
            AppAction::SetActiveCategory { .. } => "SetActiveCategory",
            AppAction::SetSearchTerm { .. } => "SetSearchTerm",
            AppAction::LoadFiles => "LoadFiles",
            AppAction::ShareFile { .. } => "ShareFile",
            AppAction::UnshareFile { .. } => "UnshareFile",
            AppAction::SignFile { .. } => "SignFile",
            AppAction::SendSignRequest { .. } => "SendSignRequest",
            AppAction::RemoveFile { .. } => "RemoveFile",
            AppAction::RemoveFileLocal { .. } => "RemoveFileLocal",
            AppAction::SetDoNotShowFileRemoveWarning { .. } => "SetDoNotShowFileRemoveWarning",
            AppAction::CloseShareProcess => "CloseShareProcess",

            // Notifications
            AppAction::SetNotificationSearchTerm { .. } => "SetNotificationSearchTerm",
            AppAction::SetShowPending { .. } => "SetShowPending",
            AppAction::HoldNotificationAction { .. } => "HoldNotificationAction",
            AppAction::ReleaseNotificationAction { .. } => "ReleaseNotificationAction",
            AppAction::UpdateNotification { .. } => "UpdateNotification",
            AppAction::UpdateFilteredNotifications { .. } => "UpdateFilteredNotifications",
            AppAction::MarkAllNotificationsRead => "MarkAllNotificationsRead",
            AppAction::DeleteNotification { .. } => "DeleteNotification",

            // Contacts
            AppAction::LoadContacts => "LoadContacts",
            AppAction::AddContact { .. } => "AddContact",
            AppAction::UpdateContactName { .. } => "UpdateContactName",
            AppAction::RemoveContact { .. } => "RemoveContact",

            // Storage providers
            AppAction::LoadStorageProviders => "LoadStorageProviders",
            AppAction::SetDefaultStorageProvider { .. } => "SetDefaultStorageProvider",

            // Wallet
            AppAction::ApproveXes { .. } => "ApproveXes",

            // Preferences
            AppAction::SetFileListViewType { .. } => "SetFileListViewType",
            AppAction::SetLanguage { .. } => "SetLanguage",

            // UI
            AppAction::ClearToast => "ClearToast",
        }
    }
}
