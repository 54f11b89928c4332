// Application-wide constants

/// Mock configuration layout
pub mod mock {
    /// Directory (relative to the project root) holding the mock config
    pub const DEFAULT_DIR: &str = "mock";
    /// Candidate entry files, first existing one wins
    pub const CONFIG_FILES: [&str; 3] = ["index.yaml", "index.yml", "index.json"];
    /// YAML tag marking a value as a registered handler function
    pub const FUNCTION_TAG: &str = "fn";
    /// Directory names whose changes never trigger a reload
    pub const IGNORED_DIRS: [&str; 3] = ["node_modules", "target", "vendor"];
}

/// Body decoding
pub mod body {
    pub const MAX_BODY_SIZE: usize = 5 * 1024 * 1024; // 5MB
}

/// Hot reload configuration
pub mod hot_reload {
    pub const CHANNEL_BUFFER_SIZE: usize = 32;
}

/// Server defaults
pub mod server {
    pub const DEFAULT_ADDR: &str = "127.0.0.1:8081";
    pub const DEFAULT_SETTINGS_FILE: &str = "devmock.yaml";
}
