//! Headless runner: log in with the configured session cookie, join the
//! waiting pool, and answer offers from a command channel (stdin in the
//! binary).

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use galaxytalk_domain::InteractionState;

use crate::application::matching_room::{MatchingRoom, RoomCommand, RoomExit, RoomUpdate};
use crate::application::services::{ChatService, MatchService, UserService};
use crate::application::state::{OfferState, SessionStore};
use crate::application::{notice_for_error, Api, ServiceError};
use crate::config::PlayerConfig;
use crate::infrastructure::platform::{DesktopStorageProvider, DesktopTimeProvider};
use crate::infrastructure::http_client::session_jar;
use crate::infrastructure::{ApiAdapter, StompRealtimeAdapter};
use crate::ports::outbound::{RawApiPort, RealtimePort, StorageProvider};

pub struct RunnerDeps {
    pub config: PlayerConfig,
    pub storage: Arc<dyn StorageProvider>,
    pub raw_api: Arc<dyn RawApiPort>,
    pub realtime: Arc<dyn RealtimePort>,
}

impl RunnerDeps {
    /// Desktop adapters for `config`.
    pub fn desktop(config: PlayerConfig) -> Self {
        let storage: Arc<dyn StorageProvider> = match &config.storage_dir {
            Some(dir) => Arc::new(DesktopStorageProvider::at(dir.join("storage.json"))),
            None => Arc::new(DesktopStorageProvider::new()),
        };
        // REST and broker share one jar, so a refreshed session reaches both
        let jar = session_jar(&config.api_base_url, config.access_token.as_deref());
        let raw_api = Arc::new(ApiAdapter::with_cookie_jar(
            &config.rest_base_url(),
            Arc::clone(&jar),
        ));
        let realtime =
            Arc::new(StompRealtimeAdapter::new(config.ws_url.clone()).with_cookie_jar(jar));
        Self {
            config,
            storage,
            raw_api,
            realtime,
        }
    }
}

/// Parse one line of user input.
pub fn parse_command(line: &str) -> Option<RoomCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "a" | "accept" => Some(RoomCommand::Accept),
        "p" | "pass" => Some(RoomCommand::Pass),
        "c" | "cancel" | "q" | "quit" => Some(RoomCommand::Cancel),
        _ => None,
    }
}

pub async fn run(
    deps: RunnerDeps,
    commands: mpsc::UnboundedReceiver<RoomCommand>,
) -> Result<RoomExit> {
    let RunnerDeps {
        config,
        storage,
        raw_api,
        realtime,
    } = deps;

    let api = Api::new(raw_api);
    let session = Arc::new(SessionStore::load(storage.clone()));
    let users = UserService::new(api.clone(), session.clone());
    let chats = ChatService::new(api.clone(), storage.clone(), Arc::new(DesktopTimeProvider));
    let matches = MatchService::new(api);

    let current = match users.load_session().await {
        Ok(current) => current,
        Err(e) if e.is_unauthorized() || e.is_session_expired() => {
            session.reset();
            match &config.oauth_url {
                Some(url) => bail!("Not logged in. Log in at {url} and set GALAXYTALK_ACCESS_TOKEN"),
                None => bail!("Not logged in. Set GALAXYTALK_ACCESS_TOKEN"),
            }
        }
        Err(e) => return Err(report(&session, &e)),
    };
    tracing::info!(
        user_id = %current.user_id(),
        state = %current.interaction_state(),
        "Session loaded"
    );

    if current.interaction_state() == InteractionState::Chatting {
        let handoff = chats
            .reconnect()
            .await
            .map_err(|e| report(&session, &ServiceError::from(e)))?;
        if let Some(handoff) = handoff {
            return Ok(RoomExit::Chat(handoff));
        }
    }

    if current.interaction_state() != InteractionState::Matching {
        let Some(concern) = &config.concern else {
            bail!("Not in the waiting pool. Set GALAXYTALK_CONCERN to join it");
        };
        matches
            .start_matching(concern, config.preferred_mbti.as_deref())
            .await
            .map_err(|e| report(&session, &e))?;
        users.refresh_status().await.map_err(|e| report(&session, &e))?;
    }

    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let room = MatchingRoom::new(realtime, Arc::new(matches), storage).with_updates(updates_tx);
    let mounted = room
        .mount(current.user_id())
        .await
        .context("Failed to connect to the matching server")?;

    let printer = tokio::spawn(print_updates(updates_rx, session.clone()));

    println!("Waiting for a match. Commands: accept | pass | cancel");
    let exit = mounted.run(commands).await;
    let _ = printer.await;

    match &exit {
        RoomExit::Chat(handoff) => {
            tracing::info!(chat_room_id = %handoff.chat_room_id, "Matched, chat created")
        }
        RoomExit::Home | RoomExit::Closed => {
            if let Err(e) = users.refresh_status().await {
                tracing::warn!("Failed to refresh interaction status: {}", e);
            }
        }
    }
    Ok(exit)
}

/// Log, clear the session if it is gone for good, and turn into an error.
fn report(session: &SessionStore, error: &ServiceError) -> anyhow::Error {
    let notice = notice_for_error(error);
    if notice.force_logout {
        session.reset();
    }
    anyhow::anyhow!("{}", notice.message)
}

/// Feed commands typed on stdin. Closing stdin cancels matching.
pub fn stdin_commands() -> mpsc::UnboundedReceiver<RoomCommand> {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    tokio::spawn(read_commands(commands_tx));
    commands_rx
}

async fn read_commands(commands: mpsc::UnboundedSender<RoomCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_command(&line) {
                Some(command) => {
                    if commands.send(command).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => println!(
                    "Unknown command {:?}. Use accept, pass or cancel",
                    line.trim()
                ),
            },
            // stdin closed: leave the room politely
            Ok(None) => {
                let _ = commands.send(RoomCommand::Cancel);
                break;
            }
            Err(e) => {
                tracing::warn!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
}

async fn print_updates(
    mut updates: mpsc::UnboundedReceiver<RoomUpdate>,
    session: Arc<SessionStore>,
) {
    while let Some(update) = updates.recv().await {
        match update {
            RoomUpdate::State(OfferState::OfferPending { offer, .. }) => {
                println!(
                    "Offer {}: \"{}\" ({}, energy {}, similarity {})",
                    offer.match_id,
                    offer.concern,
                    offer.mbti.map(|m| m.to_string()).unwrap_or_else(|| "?".into()),
                    offer.energy,
                    offer.similarity
                );
            }
            RoomUpdate::State(state) => tracing::debug!(state = %state, "Offer state"),
            RoomUpdate::RemainingTime(seconds) if seconds % 10 == 0 || seconds <= 5 => {
                println!("{seconds}s left to answer");
            }
            RoomUpdate::RemainingTime(_) => {}
            RoomUpdate::Pool(users) => println!("{} other people waiting", users.len()),
            RoomUpdate::Notice(notice) => {
                println!("{notice}");
                if notice.force_logout {
                    session.reset();
                }
            }
        }
    }
}
