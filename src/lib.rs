//! Photoreactor controller library.
//!
//! Exposes the control core (illumination, capture scheduling, cycle
//! programs, oxygen quenching) and its adapters for the host runner and
//! for integration testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod capture;
pub mod config;
pub mod cycle;
pub mod error;
pub mod illumination;
pub mod photoperiod;
pub mod quench;
pub mod sensors;
