//! Venue access: the [`ClobApi`] collaborator trait, its HTTP implementation,
//! and an in-memory mock for tests.

pub mod client;
pub mod mock;

pub use client::{ClobApi, ClobClient, OpenOrder, OrderArgs};
pub use mock::{MockClob, MockFailures};
