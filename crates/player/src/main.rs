//! GalaxyTalk Player - headless composition root binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use galaxytalk_player::application::matching_room::RoomExit;
use galaxytalk_player::{PlayerConfig, RunnerDeps};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "galaxytalk_player=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting GalaxyTalk Player");

    let config = PlayerConfig::from_env()?;
    tracing::debug!(api = %config.rest_base_url(), ws = %config.ws_url, "Loaded configuration");

    let commands = galaxytalk_player::runner::stdin_commands();
    match galaxytalk_player::run(RunnerDeps::desktop(config), commands).await? {
        RoomExit::Chat(handoff) => println!(
            "Chat room {} is ready (session {})",
            handoff.chat_room_id, handoff.session_id
        ),
        RoomExit::Home => println!("Left the waiting pool"),
        RoomExit::Closed => println!("Matching room closed"),
    }
    Ok(())
}
