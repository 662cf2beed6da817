//! pairview — pair trading data service.
//!
//! Ingests price/volume series for tradable instruments from interchangeable
//! sources, derives a synthetic combined series for a pair of instruments,
//! and keeps that derived state fresh via two background cycles.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
