pub mod api;
pub mod config_store;
pub mod defaults;
pub mod fs_util;
pub mod runtime_engine;
