//! Application core — the reactor's control logic behind port traits.
//!
//! The [`runtime::ReactorRuntime`] composes illumination, capture, cycle,
//! quench and sensor logic.  All interaction with hardware happens
//! through the **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod runtime;
