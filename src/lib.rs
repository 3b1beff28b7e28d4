pub mod cli;
pub mod client;
pub mod config;
pub mod events;
pub mod format;
pub mod rpc;
pub mod store;
pub mod tokens;
pub mod validation;

pub use client::ChainClient;
pub use config::{Config, StoreConfig};
pub use rpc::RpcClient;
pub use store::{AppState, Store};
pub use tokens::{TokenConfig, TokenRegistry};
