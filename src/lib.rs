// Library root module for speedguard
// This file defines the public API and module structure for the speedguard
// library: the violation scoring engine and the service built around it
//
// Numan Thabit 2025 Nov

pub mod api;
pub mod config;
pub mod engine;
pub mod errors;
pub mod geofence;
pub mod metrics;
pub mod registry;
pub mod scheduler;
