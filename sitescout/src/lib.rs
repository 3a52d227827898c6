pub mod commands;
pub mod handlers;

pub use commands::{DEFAULT_CONFIG_DIR, command_argument_builder};
pub use handlers::{cache_db_path, load_directory, service_config_from_args};
