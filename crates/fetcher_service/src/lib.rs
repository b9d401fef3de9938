//! Fetcher service: axum front end for the fetch-extract pipeline.
pub mod app;
pub mod config;
pub mod logging;
