pub mod api;
pub mod app_config;
pub mod catalog_storage;
pub mod demo;
pub mod library_manager;
pub mod record_codec;
pub mod telemetry;
