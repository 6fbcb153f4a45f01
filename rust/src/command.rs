//! Request/response commands against the authority.
//!
//! Commands run concurrently with channel pushes and carry no ordering
//! guarantee relative to them. Their completion is fed back into the actor
//! queue like any other event.

use futures::future::BoxFuture;

use crate::contacts::AddressEntry;
use crate::error::CommandError;
use crate::files::QueryContext;
use crate::notifications::NotificationRecord;
use crate::providers::StorageProviderRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Files come back over the channel as `fileInfo`, not in the reply.
    ListFiles {
        context: QueryContext,
    },
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
    UpdateNotification {
        notification: NotificationRecord,
    },
    MarkAllNotificationsRead,
    DeleteNotification {
        id: String,
    },
    LoadContacts,
    AddContact {
        name: String,
        address: String,
    },
    UpdateContact {
        address: String,
        name: String,
    },
    RemoveContact {
        address: String,
    },
    LoadStorageProviders,
    ApproveXes {
        xes_value: String,
    },
    Logout,
}

impl Command {
    pub fn tag(&self) -> &'static str {
        match self {
            Command::ListFiles { .. } => "ListFiles",
            Command::ShareFile { .. } => "ShareFile",
            Command::UnshareFile { .. } => "UnshareFile",
            Command::SignFile { .. } => "SignFile",
            Command::SendSignRequest { .. } => "SendSignRequest",
            Command::RemoveFile { .. } => "RemoveFile",
            Command::RemoveFileLocal { .. } => "RemoveFileLocal",
            Command::UpdateNotification { .. } => "UpdateNotification",
            Command::MarkAllNotificationsRead => "MarkAllNotificationsRead",
            Command::DeleteNotification { .. } => "DeleteNotification",
            Command::LoadContacts => "LoadContacts",
            Command::AddContact { .. } => "AddContact",
            Command::UpdateContact { .. } => "UpdateContact",
            Command::RemoveContact { .. } => "RemoveContact",
            Command::LoadStorageProviders => "LoadStorageProviders",
            Command::ApproveXes { .. } => "ApproveXes",
            Command::Logout => "Logout",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    Done,
    Contacts(Vec<AddressEntry>),
    StorageProviders(Vec<StorageProviderRecord>),
}

pub type CommandResult = Result<CommandReply, CommandError>;

/// Executes commands against the authority. Futures must not borrow the
/// client so they can be spawned on the core runtime.
pub trait CommandClient: Send + Sync {
    fn execute(&self, command: Command) -> BoxFuture<'static, CommandResult>;
}
