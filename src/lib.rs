pub mod cli;
pub mod config;
pub mod fdm;
pub mod simulator;
pub mod utils;
pub mod waypoints;
