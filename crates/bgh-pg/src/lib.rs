//! Relational history store.
//!
//! Append-only record of completed or cancelled rounds: one `games` row
//! per terminated round with JSON mirrors of the four ball sequences,
//! plus normalized child rows for downstream settlement and analytics.
//!
//! - [`Schema`] — compile-time DDL per table
//! - [`HistoryStore`] — the facade trait the manager depends on
//! - [`MemoryHistory`] — in-process implementation for tests
mod memory;
mod repository;
mod schema;

pub use memory::*;
pub use repository::*;
pub use schema::*;

/// Alias kept to read like the driver's own signatures.
pub type PgErr = tokio_postgres::Error;

/// Get a database connection and return the client.
pub async fn db() -> std::sync::Arc<tokio_postgres::Client> {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let ref url = std::env::var("DB_URL").expect("DB_URL must be set");
    let (client, connection) = tokio_postgres::connect(url, tls)
        .await
        .expect("database connection failed");
    tokio::spawn(connection);
    std::sync::Arc::new(client)
}
