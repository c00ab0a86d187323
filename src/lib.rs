pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod health;
pub mod metrics;
pub mod persisted;
pub mod proxy;
pub mod storage;
