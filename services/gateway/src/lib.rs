//! Tollgate gateway library crate.
//!
//! # Purpose
//! A policy enforcement point in front of template registration. Each request
//! is validated, turned into an authorization request, decided by an external
//! PDP, and only then allowed through to the template store.
//!
//! # Notes
//! Module boundaries follow the pipeline: [`pdp`] talks to the decision point,
//! [`pipeline`] drives the stages, [`api`] maps outcomes onto HTTP.
pub mod api;
pub mod app;
pub mod config;
pub mod observability;
pub mod pdp;
pub mod pipeline;
pub mod store;
