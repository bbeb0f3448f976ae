//! bingohall server binary.
//!
//! Serves the dealer gRPC surface and the health HTTP endpoints for one
//! process owning its configured set of rooms.

#[tokio::main]
async fn main() {
    bgh_core::log();
    bgh_core::kys();
    bgh_server::run().await.unwrap();
}
