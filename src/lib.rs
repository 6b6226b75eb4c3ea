// Library exports for launchspec

pub mod cli;
pub mod config;
pub mod error;
pub mod launch;
pub mod platform;
