//! Process wiring for the bingohall control plane.
//!
//! Explicit construction in dependency order: stores, broker, hub and
//! sink stack, manager, then the serving surfaces. Readiness flips true
//! only once the manager finished rebuilding state from the stores.
//!
//! ## Submodules
//!
//! - [`service`] — dealer gRPC command ingress and event streaming
//! - [`health`] — liveness/readiness HTTP endpoints

pub mod health;
pub mod service;

pub use service::DealerGrpc;

use bgh_broker::Broker;
use bgh_cache::LiveStore;
use bgh_cache::RedisStore;
use bgh_core::RoomId;
use bgh_gameroom::BrokerSink;
use bgh_gameroom::Fanout;
use bgh_gameroom::Hub;
use bgh_gameroom::HubSink;
use bgh_gameroom::LogSink;
use bgh_gameroom::Manager;
use bgh_pg::HistoryStore;
use bgh_wire::pb::dealer_service_server::DealerServiceServer;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

fn env_or(name: &str, fallback: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| fallback.to_string())
}

/// Rooms this process owns, comma-separated in `ROOMS`.
fn rooms_from_env() -> Vec<RoomId> {
    env_or("ROOMS", "SG01")
        .split(',')
        .map(|room| room.trim().to_string())
        .filter(|room| !room.is_empty())
        .collect()
}

pub async fn run() -> anyhow::Result<()> {
    let rooms = rooms_from_env();
    anyhow::ensure!(!rooms.is_empty(), "ROOMS must name at least one room");

    // liveness comes up immediately; readiness waits for the manager
    let ready = Arc::new(AtomicBool::new(false));
    let health_addr = env_or("HEALTH_ADDR", "0.0.0.0:8080");
    {
        let ready = Arc::clone(&ready);
        std::thread::spawn(move || {
            if let Err(e) = health::serve(health_addr, ready) {
                log::error!("health server exited: {}", e);
            }
        });
    }

    let live: Arc<dyn LiveStore> = Arc::new(
        RedisStore::connect(&env_or("REDIS_URL", "redis://127.0.0.1/")).await?,
    );
    let client = bgh_pg::db().await;
    bgh_pg::migrate(&client).await?;
    let history: Arc<dyn HistoryStore> = Arc::new(client);
    let broker = Arc::new(Broker::connect(std::env::var("KAFKA_BROKERS").ok().as_deref()));

    let hub = Arc::new(Hub::new());
    let sinks = Fanout::new()
        .register(Arc::new(LogSink))
        .register(Arc::new(HubSink::new(Arc::clone(&hub))))
        .register(Arc::new(BrokerSink::new(broker)));
    let manager = Arc::new(Manager::new(rooms, live, history, hub, sinks));
    manager.start().await?;
    ready.store(true, Ordering::SeqCst);

    let addr = env_or("GRPC_ADDR", "0.0.0.0:50051").parse()?;
    log::info!("dealer service on {}", addr);
    tonic::transport::Server::builder()
        .add_service(DealerServiceServer::new(DealerGrpc::new(Arc::clone(&manager))))
        .serve_with_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutdown signal received");
        })
        .await?;
    manager.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn rooms_parse_trims_and_drops_blanks() {
        // SAFETY: tests in this module do not race over this variable
        unsafe { std::env::set_var("ROOMS", " SG01, SG02 ,,") };
        assert_eq!(rooms_from_env(), vec!["SG01".to_string(), "SG02".to_string()]);
        unsafe { std::env::remove_var("ROOMS") };
    }
}
