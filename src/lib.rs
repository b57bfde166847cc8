pub mod level;
pub mod filter;
pub mod record;
pub mod telemetry;
pub mod translate;
pub mod sink;

pub mod client;
pub mod channel;
pub mod transmitter;

pub mod config;
pub mod env;
pub mod encoder;
pub mod layer;
pub mod init;

pub use config::Config;
pub use init::{init_tracing, init_tracing_with_options, new_app_insights_layer, InitError, InitOptions};
pub use level::{LogLevel, SeverityLevel};
pub use sink::{AppInsightsSink, LogWriter, SinkError};
