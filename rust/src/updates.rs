use crate::channel::{ChannelMessage, ChannelTransport};
use crate::command::{Command, CommandResult};
use crate::state::AppState;
use crate::AppAction;

#[derive(Clone, Debug)]
pub enum AppUpdate {
    /// Every change is published as a full snapshot.
    FullState(AppState),
}

impl AppUpdate {
    pub fn rev(&self) -> u64 {
        match self {
            AppUpdate::FullState(s) => s.rev,
        }
    }
}

pub enum CoreMsg {
    Action(AppAction),
    /// Delivered directly by the embedder.
    Channel(ChannelMessage),
    /// Forwarded by an attached transport, stamped with the attachment it
    /// came through.
    ChannelPush {
        epoch: u64,
        msg: ChannelMessage,
    },
    AttachChannel(Box<dyn ChannelTransport>),
    Internal(Box<InternalEvent>),
}

impl std::fmt::Debug for CoreMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreMsg::Action(a) => f.debug_tuple("Action").field(&a.tag()).finish(),
            CoreMsg::Channel(m) => f.debug_tuple("Channel").field(&m.kind).finish(),
            CoreMsg::ChannelPush { epoch, msg } => f
                .debug_struct("ChannelPush")
                .field("epoch", epoch)
                .field("kind", &msg.kind)
                .finish(),
            CoreMsg::AttachChannel(_) => f.write_str("AttachChannel"),
            CoreMsg::Internal(e) => f.debug_tuple("Internal").field(e).finish(),
        }
    }
}

#[derive(Debug)]
pub enum InternalEvent {
    CommandFinished {
        command: Command,
        result: CommandResult,
    },
    ToastAutoDismiss {
        token: u64,
    },
}
