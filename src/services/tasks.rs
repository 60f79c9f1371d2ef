//! Periodic maintenance loops (§4.9): daily chat rollover and global rank
//! recomputation, grounded exactly on the original `systemDayChange` and
//! `computeRanks` scheduling.

use chrono::{Local, NaiveTime, TimeZone};
use log::{error, info};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::database::interface;
use crate::services::lobby::{ChatMessage, Lobbies};

/// Seconds between "now" and the next local midnight, plus one second of
/// slack matching the original's `+1` reschedule.
fn seconds_until_next_midnight() -> i64 {
    let now = Local::now();
    let midnight = now.date_naive().succ_opt().unwrap().and_time(NaiveTime::MIN);
    let midnight = Local.from_local_datetime(&midnight).single().unwrap_or(now);
    (midnight - now).num_seconds().max(0) + 1
}

/// Runs forever: at each local midnight, broadcasts a "Date: …" system
/// message to every lobby, purges chat older than 5 days, then reschedules
/// for the following midnight.
pub async fn run_day_change_loop(lobbies: Arc<Lobbies>) {
    loop {
        let delay = seconds_until_next_midnight();
        tokio::time::sleep(StdDuration::from_secs(delay as u64)).await;

        let now = Local::now();
        let message = format!("Date: {}", now.format("%a %b %e %H:%M:%S %Y"));
        info!("Daily chat rollover: {message}");

        for lobby in lobbies.all() {
            lobby.add_to_chat_history(ChatMessage::system(message.clone()));
            lobby.purge_old_chat();
        }
    }
}

/// Runs forever: recomputes global ranks every `interval`, logging and
/// continuing on failure rather than aborting the loop (§7: storage errors
/// are logged, never allowed to corrupt in-memory state or crash a task).
pub async fn run_rank_recompute_loop(db: DatabaseConnection, interval: StdDuration) {
    loop {
        tokio::time::sleep(interval).await;

        match interface::recompute_ranks(&db).await {
            Ok(()) => info!("Recomputed global ranks"),
            Err(err) => error!("Failed to recompute ranks: {err:?}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn midnight_delay_is_positive_and_bounded() {
        let delay = seconds_until_next_midnight();
        assert!(delay > 0);
        assert!(delay <= 86401);
    }
}
