pub mod csv_data_adapter;
pub mod csv_log_adapter;
pub mod file_config_adapter;
