//! Domain layer for the Sensor Dash backend.
//!
//! Contains the alert-rule and user-preference models with their
//! request/response DTOs, plus pure business-logic services: the
//! coordination plan that keeps the preference aggregate in step with
//! rule mutations, and the reconciliation repair computation.

pub mod models;
pub mod services;
