//! Redis connection settings.
//!
//! Raw values come from CLI flags or the environment. Missing or empty values
//! fall back to defaults. A malformed address or an unparsable database index
//! also falls back to its default, with a warning, and never aborts startup.

pub const DEFAULT_REDIS_ADDR: &str = "localhost:6379";
pub const DEFAULT_REDIS_DB: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisSettings {
    pub addr: String,
    pub password: Option<String>,
    pub db: i64,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            addr: DEFAULT_REDIS_ADDR.to_string(),
            password: None,
            db: DEFAULT_REDIS_DB,
        }
    }
}

impl RedisSettings {
    /// Build settings from raw (possibly empty) string values.
    pub fn from_raw(addr: Option<&str>, password: Option<&str>, db: Option<&str>) -> Self {
        let addr = match addr.map(str::trim).filter(|a| !a.is_empty()) {
            None => DEFAULT_REDIS_ADDR.to_string(),
            // host:port only; credentials and paths belong to REDIS_PASSWORD / REDIS_DB
            Some(raw) if raw.contains('/') || raw.contains('@') => {
                tracing::warn!(
                    "REDIS_ADDR '{}' is not a host:port address, using {}",
                    raw,
                    DEFAULT_REDIS_ADDR
                );
                DEFAULT_REDIS_ADDR.to_string()
            }
            Some(addr) => addr.to_string(),
        };

        let password = password.filter(|p| !p.is_empty()).map(str::to_string);

        let db = match db.map(str::trim).filter(|d| !d.is_empty()) {
            None => DEFAULT_REDIS_DB,
            Some(raw) => match raw.parse::<i64>() {
                Ok(db) if db >= 0 => db,
                Ok(_) | Err(_) => {
                    tracing::warn!(
                        "REDIS_DB '{}' is not a valid database index, using {}",
                        raw,
                        DEFAULT_REDIS_DB
                    );
                    DEFAULT_REDIS_DB
                }
            },
        };

        Self { addr, password, db }
    }

    /// `redis://[:password@]host:port/db`
    pub fn connection_url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}/{}",
                urlencoding::encode(password),
                self.addr,
                self.db
            ),
            None => format!("redis://{}/{}", self.addr, self.db),
        }
    }

    /// Connection target without credentials, for logs.
    pub fn redacted(&self) -> String {
        format!("redis://{}/{}", self.addr, self.db)
    }
}
