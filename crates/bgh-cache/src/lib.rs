//! Live store facade.
//!
//! One slot per room holds the serialized current round; one global slot
//! holds the lucky-number roster. Completed and cancelled rounds never
//! live here, only in the history store.
//!
//! - [`LiveStore`] — the facade trait the manager depends on
//! - [`RedisStore`] — production implementation over redis
//! - [`MemoryStore`] — in-process implementation for tests and demos
mod error;
mod memory;
mod store;

pub use error::*;
pub use memory::*;
pub use store::*;
