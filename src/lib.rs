pub mod cli;
pub mod clover;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod services;
