//! Usage Service - Subscriber billing cycles and daily data-usage reporting.

pub mod config;
pub mod error;
pub mod grpc;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
