pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: i64 = 3000;
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 2;

pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60;
pub const DEFAULT_MIN_PASSWORD_LEN: i64 = 4;

pub const DEFAULT_MAX_SESSIONS: i64 = 3;
pub const DEFAULT_SESSION_STORE_TIMEOUT_MS: i64 = 250;

pub const DEFAULT_NOTIFY_QUEUE_SIZE: i64 = 256;
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_SENDER_EMAIL: &str = "no-reply@localhost";
