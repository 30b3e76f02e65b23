// Application layer - Session orchestration over the metering repository
pub mod dashboard_session;
pub mod historical_fetcher;
pub mod live_poller;
pub mod metering_repository;
pub mod round_gate;
pub mod series_cache;

#[cfg(test)]
pub mod testing;
