mod load;
mod types;

pub use load::{
    default_results_dir, get_agentflow_data_dir, load_default, load_from_path, LOCAL_CONFIG_FILE,
};
pub use types::{
    AppConfig, ExecutorConfig, ExecutorType, LoggingConfig, OutputConfig, OutputFormat,
    SinkConfig,
};
