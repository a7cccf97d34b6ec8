//! rankwatch library
//!
//! Serves per-domain popularity rank histories from a local cache, refreshing
//! from a Tranco-style ranking provider only when a domain's cache is older
//! than the configured TTL. `ranking::RankingService` is the entry point.

pub mod assemble;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod freshness;
pub mod ranking;
pub mod refresh;
pub mod sparkline;

#[cfg(test)]
mod testing;
