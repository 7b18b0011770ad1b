//! AQI Dashboard - station-level air quality drill-down over an AQI star schema.
//!
//! # Overview
//!
//! A user narrows state → city → station → date and gets the hourly AQI and
//! pollutant readings of that station-day as chart, table and map inputs,
//! plus an all-India map of the latest AQI per station.
//!
//! The warehouse is populated upstream. This crate only issues
//! parameterized read queries and shapes their rows for display; it never
//! computes AQI.
//!
//! # Modules
//!
//! - [`query`]: Static query templates with bound parameters
//! - [`filter`]: Cascading drill-down selection
//! - [`aqi`]: AQI severity bands and colors
//! - [`projector`]: Per-view slices of query rows
//! - [`warehouse`]: SQLite access to the star schema
//! - [`dashboard`]: The render pipeline tying the above together
//! - [`api`]: HTTP API handlers

pub mod api;
pub mod aqi;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod model;
pub mod projector;
pub mod query;
pub mod warehouse;
