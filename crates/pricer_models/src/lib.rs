//! # Pricer Models (L2: Business Logic)
//!
//! Option formulas, the SABR smile model and swaption instruments.
//!
//! This crate provides:
//! - Bachelier and displaced Black formulas with implied-volatility inversion
//! - Displaced SABR normal volatilities (Hagan expansion)
//! - Payment schedules generated from month offsets
//! - Swaption quote lattices and conversion between quoting conventions
//! - SABR volatility cubes and replication pricing of cash-settled swaptions
//!
//! ## Design Principles
//!
//! - **Enum-based conventions** with exhaustive matches
//! - **Build then freeze** for quote lattices
//! - **Explicit errors**: every fallible operation returns `Result`

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytical;
pub mod models;
pub mod schedules;
pub mod swaptions;
