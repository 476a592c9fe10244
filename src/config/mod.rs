mod settings;

pub use settings::{
    ApiConfig, BlocksConfig, DatabaseConfig, EditorConfig, JwtConfig, LoggingConfig, OtelConfig,
    PointsConfig, ServerConfig, Settings,
};
