pub mod cache;
pub mod cli;
pub mod config;
pub mod datasources;
pub mod db;
pub mod error;
pub mod logic;
pub mod models;
pub mod ui;
