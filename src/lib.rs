//! Collector and control gateway for an EMS-style residential heating bus.
//!
//! The crate is organised by the pipeline a telegram flows through: a
//! [`gateway`] delivers raw frames, [`frame`] and [`decoder`] turn them into
//! typed [`value::Value`]s for a collector to consume, and [`command`],
//! [`connection`], [`server`] and [`router`] let a TCP client drive the bus
//! the other way.

pub mod address;
pub mod command;
pub mod config;
pub mod connection;
pub mod decoder;
pub mod descriptors;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod gateway;
pub mod router;
pub mod server;
pub mod value;

pub use command::Command;
pub use config::{Args, CommandServerConfig, GatewayConfig};
pub use decoder::Decoder;
pub use error::{CommandError, GatewayError};
pub use frame::Frame;
pub use gateway::{Gateway, TcpGateway};
pub use router::RouterHandle;
pub use server::CommandServer;
pub use value::Value;
