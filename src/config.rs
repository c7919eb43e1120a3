use anyhow::{bail, Context, Result};
use std::{path::PathBuf, str::FromStr, time::Duration};

/// Runtime settings, read once at startup and passed to each component.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Ingestion path without the leading slash.
    pub path: String,
    pub data_dir: PathBuf,
    pub db_file: String,
    /// Empty disables the raw packet log.
    pub audit_file: String,
    pub audit_truncate: bool,
    pub status_delay: Duration,
    /// `None` announces status once.
    pub status_interval: Option<Duration>,
    /// `None` accepts request bodies of any size.
    pub max_body_bytes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            path: "forwardedChats".into(),
            data_dir: PathBuf::from("./data"),
            db_file: "chat_messages.db".into(),
            audit_file: "data.ndjson".into(),
            audit_truncate: true,
            status_delay: Duration::from_secs(3),
            status_interval: Some(Duration::from_secs(300)),
            max_body_bytes: Some(crate::server::DEFAULT_BODY_LIMIT),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("CHATLINE_HOST") {
            config.host = host;
        }
        if let Some(port) = parse(&lookup, "CHATLINE_PORT")? {
            config.port = port;
        }
        if let Some(path) = lookup("CHATLINE_PATH") {
            config.path = path.trim_matches('/').to_string();
            validate_route_path(&config.path)
                .with_context(|| format!("Invalid value for CHATLINE_PATH: {path:?}"))?;
        }
        if let Some(dir) = lookup("CHATLINE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(db_file) = lookup("CHATLINE_DB_FILE") {
            config.db_file = db_file;
        }
        if let Some(audit_file) = lookup("CHATLINE_AUDIT_FILE") {
            config.audit_file = audit_file;
        }
        if let Some(truncate) = parse(&lookup, "CHATLINE_AUDIT_TRUNCATE")? {
            config.audit_truncate = truncate;
        }
        if let Some(secs) = parse::<u64>(&lookup, "CHATLINE_STATUS_DELAY_SECS")? {
            config.status_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64>(&lookup, "CHATLINE_STATUS_INTERVAL_SECS")? {
            config.status_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(bytes) = parse::<usize>(&lookup, "CHATLINE_MAX_BODY_BYTES")? {
            config.max_body_bytes = (bytes > 0).then_some(bytes);
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    pub fn audit_path(&self) -> Option<PathBuf> {
        (!self.audit_file.is_empty()).then(|| self.data_dir.join(&self.audit_file))
    }

    /// The ingestion route, e.g. `/forwardedChats`.
    pub fn route(&self) -> String {
        format!("/{}", self.path)
    }
}

/// Route segments must be literal: no empty segments and none of the
/// characters the router treats as captures or wildcards.
fn validate_route_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Ok(());
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            bail!("empty path segment");
        }
        if let Some(c) = segment
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')))
        {
            bail!("unsupported character {c:?} in segment {segment:?}");
        }
    }
    Ok(())
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {key}: {raw:?}"))
        })
        .transpose()
}
