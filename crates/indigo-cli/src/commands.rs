//! Command implementations, kept free of I/O so they can be tested directly.

use anyhow::Context;
use indigo_core::{GameState, ReplayLog};
use tracing::info;

/// Parse and replay a log from its text
fn load(text: &str) -> anyhow::Result<GameState> {
    let log: ReplayLog = text.parse().context("failed to parse game log")?;
    let game = log.replay().context("failed to replay game log")?;
    info!(
        teams = log.config.teams.len(),
        actions = log.entries.len(),
        finished = game.is_finished(),
        "game replayed"
    );
    Ok(game)
}

/// Final snapshot of the logged game as JSON
pub fn replay(text: &str, team: Option<&str>, pretty: bool) -> anyhow::Result<String> {
    let game = load(text)?;
    let snapshot = game.snapshot(team)?;
    let json = if pretty {
        snapshot.to_json_pretty()
    } else {
        snapshot.to_json()
    };
    json.context("failed to serialize snapshot")
}

/// The logged game re-encoded from its replayed state
pub fn normalize(text: &str) -> anyhow::Result<String> {
    Ok(load(text)?.to_log().to_string())
}
