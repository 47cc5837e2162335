pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod omdb;
pub mod session;
pub mod watchlist;
