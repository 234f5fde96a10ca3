pub mod config_port;
pub mod data_port;
pub mod log_port;
