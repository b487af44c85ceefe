mod settings;

pub use settings::{DatabaseConfig, SendGridConfig, ServerConfig, Settings, TermiiConfig};
