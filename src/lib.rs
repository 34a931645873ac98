//! Realtime core for a social ski-tracking service (spec §1): live
//! location fan-out plus a chat fabric, sharing one horizontal scaling
//! substrate across an elastic node fleet.

pub mod backplane;
pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod hot;
pub mod http;
pub mod jobqueue;
pub mod location;
pub mod metrics;
pub mod model;
pub mod state;
pub mod token;
pub mod warm;
