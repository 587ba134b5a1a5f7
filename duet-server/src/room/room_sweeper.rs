use crate::room::RoomRegistry;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Periodically destroys rooms that were created but never joined, or that
/// sat empty for longer than `max_idle`.
pub fn spawn_idle_sweeper(
    registry: RoomRegistry,
    interval: Duration,
    max_idle: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let swept = registry.sweep_idle(max_idle);
            debug!(
                "Idle sweep removed {} rooms, {} remain",
                swept,
                registry.room_count()
            );
        }
    })
}
