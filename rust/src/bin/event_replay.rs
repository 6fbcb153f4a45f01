//! Feed a JSON-lines capture of channel messages through the core and print
//! the resulting views.
//!
//! usage: event_replay <messages.jsonl> [--identity ADDR] [--category CAT]
//!        [--search TERM] [--data-dir DIR]

use std::sync::{Arc, RwLock};

use anyhow::{anyhow, bail, Context, Result};
use drive_core::files::FileCategory;
use drive_core::{AppAction, AppCore, AppState, ChannelMessage, CoreMsg};

struct Args {
    input: String,
    identity: Option<String>,
    category: Option<FileCategory>,
    search: Option<String>,
    data_dir: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut input = None;
    let mut identity = None;
    let mut category = None;
    let mut search = None;
    let mut data_dir = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| anyhow!("{flag} needs a value"))
        };
        match arg.as_str() {
            "--identity" => identity = Some(value("--identity")?),
            "--category" => {
                let raw = value("--category")?;
                category = Some(
                    FileCategory::parse(&raw).ok_or_else(|| anyhow!("unknown category {raw:?}"))?,
                );
            }
            "--search" => search = Some(value("--search")?),
            "--data-dir" => data_dir = Some(value("--data-dir")?),
            s if s.starts_with("--") => bail!("unknown flag {s}"),
            _ if input.is_none() => input = Some(arg),
            _ => bail!("unexpected argument {arg}"),
        }
    }

    Ok(Args {
        input: input.ok_or_else(|| {
            anyhow!("usage: event_replay <messages.jsonl> [--identity ADDR] [--category CAT] [--search TERM] [--data-dir DIR]")
        })?,
        identity,
        category,
        search,
        data_dir,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => std::env::temp_dir()
            .join("drive_core_replay")
            .to_string_lossy()
            .to_string(),
    };
    std::fs::create_dir_all(&data_dir).with_context(|| format!("create {data_dir}"))?;

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read {}", args.input))?;

    let (update_tx, _update_rx) = flume::unbounded();
    let (core_tx, _core_rx) = flume::unbounded();
    let shared_state = Arc::new(RwLock::new(AppState::empty()));
    let mut core = AppCore::new(update_tx, core_tx, data_dir, shared_state, None);

    if let Some(address) = args.identity {
        core.handle_message(CoreMsg::Action(AppAction::SetIdentity { address }));
    }
    if let Some(category) = args.category {
        core.handle_message(CoreMsg::Action(AppAction::SetActiveCategory { category }));
    }
    if let Some(term) = args.search {
        core.handle_message(CoreMsg::Action(AppAction::SetSearchTerm { term }));
    }

    let mut fed = 0usize;
    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match ChannelMessage::from_json(line) {
            Ok(msg) => {
                core.handle_message(CoreMsg::Channel(msg));
                fed += 1;
            }
            Err(e) => tracing::warn!(line = lineno + 1, %e, "skipping line"),
        }
    }
    tracing::info!(fed, "replay done");

    let state = &core.state;
    let views = serde_json::json!({
        "rev": state.rev,
        "groupKey": state.files.context().group_key(),
        "files": state.filtered_files(),
        "transactions": state.transaction_queue(),
        "notifications": state.filtered_notifications(),
        "pendingNotifications": state.pending_notifications_count(),
        "signingRequests": state.notifications.signing_requests(),
        "contacts": state.contacts_merged(),
        "defaultStorageProvider": state.default_storage_provider(),
        "wallet": state.wallet,
        "toast": state.toast,
    });
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}
