use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::url::{Url, UrlError};

const STREAM_SECTION: &str = "stream";
const LOGGING_SECTION: &str = "logging";

const DEFAULT_BITRATE_KBPS: u32 = 5_000;
const DEFAULT_FPS: u32 = 30;
const DEFAULT_MTU: usize = 1_400;
const DEFAULT_CHANNEL_CAPACITY: usize = 5;
pub const DEFAULT_STUN_SERVER: &str = "stun1.l.google.com:19302";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("missing required key [{section}] {key}")]
    Missing { section: String, key: String },
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
    #[error(transparent)]
    Url(#[from] UrlError),
}

/// INI-style key/value store: `[section]` headers, `key = value`, `#` comments.
#[derive(Debug)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut cfg = Self::empty();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = Some(name.trim().to_string());
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                let value = value.trim().trim_matches('"').to_string();

                match &current_section {
                    None => {
                        cfg.globals.insert(key, value);
                    }
                    Some(sec) => {
                        cfg.sections
                            .entry(sec.clone())
                            .or_default()
                            .insert(key, value);
                    }
                }
            }
        }
        cfg
    }

    pub fn empty() -> Self {
        Self {
            globals: HashMap::new(),
            sections: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(String::as_str)
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(String::as_str)
    }

    /// Section value, then global value, then `default`.
    #[must_use]
    pub fn get_or_default<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key)
            .or_else(|| self.get_global(key))
            .unwrap_or(default)
    }

    #[must_use]
    pub fn get_non_empty_or_default<'a>(
        &'a self,
        section: &str,
        key: &str,
        default: &'a str,
    ) -> &'a str {
        self.get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
            .unwrap_or(default)
    }

    /// Parses `[section] key` (falling back to the global key) into `T`.
    pub fn parse_or<T: FromStr>(&self, section: &str, key: &str, default: T) -> Result<T, ConfigError> {
        match self
            .get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
        {
            None => Ok(default),
            Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::Invalid {
                key: key.to_owned(),
                value: raw.to_owned(),
            }),
        }
    }
}

/// Typed view the transports consume.
///
/// ```ini
/// [stream]
/// url = tcp://0.0.0.0:8080
/// p2p = true
/// upnp = true
/// bitrate = 5000
///
/// [logging]
/// dir = ~/.rustyshare/logs
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    pub p2p: bool,
    /// ask the router for a port mapping while gathering candidates
    pub upnp: bool,
    pub url: Url,
    /// kbit/s, handed to the encoder stage
    pub bitrate: u32,
    pub fps: u32,
    /// largest FU-A payload per RTP packet
    pub mtu: usize,
    pub stun_server: String,
    pub log_dir: Option<PathBuf>,
    pub channel_capacity: usize,
}

impl StreamConfig {
    pub fn new(url: Url) -> Self {
        Self {
            p2p: false,
            upnp: false,
            url,
            bitrate: DEFAULT_BITRATE_KBPS,
            fps: DEFAULT_FPS,
            mtu: DEFAULT_MTU,
            stun_server: DEFAULT_STUN_SERVER.to_owned(),
            log_dir: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        let raw_url = cfg
            .get_non_empty(STREAM_SECTION, "url")
            .or_else(|| cfg.get_global("url").filter(|s| !s.is_empty()))
            .ok_or_else(|| ConfigError::Missing {
                section: STREAM_SECTION.to_owned(),
                key: "url".to_owned(),
            })?;

        let mut out = Self::new(Url::parse(raw_url)?);
        out.p2p = parse_bool("p2p", cfg.get_non_empty_or_default(STREAM_SECTION, "p2p", "false"))?;
        out.upnp = parse_bool("upnp", cfg.get_non_empty_or_default(STREAM_SECTION, "upnp", "false"))?;
        out.bitrate = cfg.parse_or(STREAM_SECTION, "bitrate", DEFAULT_BITRATE_KBPS)?;
        out.fps = cfg.parse_or(STREAM_SECTION, "fps", DEFAULT_FPS)?;
        out.mtu = cfg.parse_or(STREAM_SECTION, "mtu", DEFAULT_MTU)?;
        out.channel_capacity =
            cfg.parse_or(STREAM_SECTION, "channel_capacity", DEFAULT_CHANNEL_CAPACITY)?;
        out.stun_server = cfg
            .get_non_empty_or_default(STREAM_SECTION, "stun_server", DEFAULT_STUN_SERVER)
            .to_owned();
        out.log_dir = cfg.get_non_empty(LOGGING_SECTION, "dir").map(PathBuf::from);

        if out.mtu == 0 || out.fps == 0 {
            return Err(ConfigError::Invalid {
                key: if out.mtu == 0 { "mtu" } else { "fps" }.to_owned(),
                value: "0".to_owned(),
            });
        }
        Ok(out)
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key: key.to_owned(),
            value: raw.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::url::Protocol;

    const SAMPLE: &str = r#"
# broadcaster
mtu = 1200

[stream]
url = "tcp://0.0.0.0:9000"
p2p = yes
bitrate = 8000

[logging]
dir = /tmp/rustyshare
"#;

    #[test]
    fn parse_sections_and_globals() {
        let cfg = Config::parse(SAMPLE);
        assert_eq!(cfg.get("stream", "url"), Some("tcp://0.0.0.0:9000"));
        assert_eq!(cfg.get_global("mtu"), Some("1200"));
        assert_eq!(cfg.get_or_default("stream", "mtu", "1400"), "1200");
        assert_eq!(cfg.get_or_default("stream", "fps", "30"), "30");
        assert_eq!(cfg.get("nope", "url"), None);
    }

    #[test]
    fn stream_config_from_config_ok() {
        let sc = StreamConfig::from_config(&Config::parse(SAMPLE)).unwrap();
        assert!(sc.p2p);
        assert!(!sc.upnp);
        assert_eq!(sc.url.protocol(), Protocol::Tcp);
        assert_eq!(sc.url.port(), 9000);
        assert_eq!(sc.bitrate, 8000);
        assert_eq!(sc.fps, 30);
        assert_eq!(sc.mtu, 1200);
        assert_eq!(sc.stun_server, DEFAULT_STUN_SERVER);
        assert_eq!(sc.log_dir, Some(PathBuf::from("/tmp/rustyshare")));
    }

    #[test]
    fn stream_config_requires_url() {
        let err = StreamConfig::from_config(&Config::parse("[stream]\np2p = true\n")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
    }

    #[test]
    fn stream_config_rejects_garbage_numbers() {
        let cfg = Config::parse("[stream]\nurl = rtp://127.0.0.1:1336\nbitrate = fast\n");
        match StreamConfig::from_config(&cfg) {
            Err(ConfigError::Invalid { key, value }) => {
                assert_eq!(key, "bitrate");
                assert_eq!(value, "fast");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn stream_config_upnp_flag() {
        let cfg = Config::parse("[stream]\nurl = tcp://10.0.0.1\nupnp = on\n");
        assert!(StreamConfig::from_config(&cfg).unwrap().upnp);

        let cfg = Config::parse("[stream]\nurl = tcp://10.0.0.1\nupnp = maybe\n");
        match StreamConfig::from_config(&cfg) {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "upnp"),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = Config::load("/definitely/not/here.ini").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
