//! A single-page chess board: two-click move input, an optional automated opponent and
//! a locally persisted session, with the rules delegated to the `chess` crate.

pub mod config;
pub mod game;
pub mod models;
pub mod routes;
pub mod storage;
pub mod websocket;
