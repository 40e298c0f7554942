pub mod activity;
pub mod agent;
pub mod capture;
pub mod config;
pub mod data_storage;
pub mod heartbeat;
pub mod idle;
pub mod messages;
pub mod monitor;
pub mod power;
pub mod scheduler;
pub mod session;
pub mod timer;
pub mod tracker;
pub mod window;
