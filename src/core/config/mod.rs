pub mod defaults;
pub mod paths;
pub mod secrets;
pub mod service;
pub mod settings;
pub mod validation;

pub use paths::AppPaths;
pub use secrets::{ApiKey, Secrets};
pub use service::ConfigService;
pub use settings::Settings;
