//! Cisco Meraki Dashboard API client.
//!
//! The bot only reads organizations, so the surface is the [`DashboardApi`]
//! trait with an HTTP implementation in [`client`]. Every call takes the API
//! key explicitly; the client itself holds no credentials.

pub mod client;

pub use client::{DashboardApi, DashboardError, HttpDashboardClient};
