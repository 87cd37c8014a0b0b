//! Kafka writer and reader wrapped with the processing shim.
//!
//! Every message goes through [`processing_shim::process`] exactly once:
//! before it is sent by the [`Writer`], and after it is fetched by the
//! [`Reader`]. With processing disabled both behave as plain clients.

pub mod config;
pub mod error;

/// Consumer side: fetch, then process
pub mod reader;

/// Producer side: process, then send
pub mod writer;

pub use config::{ReaderConfig, WriterConfig};
pub use error::{Error, Result};
pub use reader::Reader;
pub use writer::Writer;

pub use processing_shim::{CallContext, Message};
