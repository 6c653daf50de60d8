//! Messaging context configuration.
//!
//! The cluster configuration arrives as a flat key/value map. Four keys are
//! read, once each, when a context is initialized:
//!
//! | key                  | field             | default  |
//! |----------------------|-------------------|----------|
//! | `zmq.threads`        | `thread_count`    | 1        |
//! | `zmq.linger.millis`  | `linger`          | 5000 ms  |
//! | `zmq.hwm`            | `high_water_mark` | 0        |
//! | `storm.cluster.mode` | `is_local`        | local    |
//!
//! Integer settings accept JSON numbers or decimal strings.

use std::time::Duration;

use conduit_core::error::{ConduitError, Result};
use serde_json::{Map, Value};

/// Key/value configuration source.
pub type Settings = Map<String, Value>;

/// Number of transport I/O threads.
pub const ZMQ_THREADS: &str = "zmq.threads";

/// Linger applied to send-side sockets, in milliseconds.
pub const ZMQ_LINGER_MILLIS: &str = "zmq.linger.millis";

/// High water mark applied to every socket.
pub const ZMQ_HWM: &str = "zmq.hwm";

/// Deployment mode; `"local"` selects IPC addressing.
pub const CLUSTER_MODE: &str = "storm.cluster.mode";

/// Cluster mode value that selects local addressing.
pub const LOCAL_MODE: &str = "local";

/// Default I/O thread count
pub const DEFAULT_THREAD_COUNT: usize = 1;

/// Default linger (5 seconds)
pub const DEFAULT_LINGER: Duration = Duration::from_millis(5000);

/// Default high water mark (unbounded)
pub const DEFAULT_HIGH_WATER_MARK: u64 = 0;

/// Configuration derived once at initialization.
///
/// # Examples
///
/// ```
/// use conduit::config::ContextConfig;
/// use std::time::Duration;
///
/// let config = ContextConfig::default()
///     .with_thread_count(2)
///     .with_high_water_mark(1000)
///     .with_local(false);
/// assert_eq!(config.linger, Duration::from_millis(5000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// Transport I/O threads, always at least 1
    pub thread_count: usize,

    /// Linger for send-side sockets
    pub linger: Duration,

    /// Per-socket queue bound, 0 = unbounded
    pub high_water_mark: u64,

    /// Whether peers share a host (IPC addressing)
    pub is_local: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            thread_count: DEFAULT_THREAD_COUNT,
            linger: DEFAULT_LINGER,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            is_local: true, // absent cluster mode means local
        }
    }
}

impl ContextConfig {
    /// Derive the configuration from a settings map.
    ///
    /// Missing keys (or `null` values) fall back to the defaults. Malformed
    /// values fail with [`ConduitError::Configuration`].
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let thread_count = read_int(settings, ZMQ_THREADS)?
            .map(|threads| {
                usize::try_from(threads)
                    .ok()
                    .filter(|&threads| threads >= 1)
                    .ok_or_else(|| {
                        ConduitError::configuration(
                            ZMQ_THREADS,
                            format!("thread count must be positive, got {threads}"),
                        )
                    })
            })
            .transpose()?
            .unwrap_or(DEFAULT_THREAD_COUNT);

        let linger = read_non_negative(settings, ZMQ_LINGER_MILLIS)?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_LINGER);

        let high_water_mark =
            read_non_negative(settings, ZMQ_HWM)?.unwrap_or(DEFAULT_HIGH_WATER_MARK);

        let is_local = cluster_mode(settings)? == LOCAL_MODE;

        Ok(Self {
            thread_count,
            linger,
            high_water_mark,
            is_local,
        })
    }

    /// Derive the configuration from a JSON object document.
    ///
    /// # Examples
    ///
    /// ```
    /// use conduit::config::ContextConfig;
    ///
    /// let config = ContextConfig::from_json_str(
    ///     r#"{"zmq.hwm": 500, "storm.cluster.mode": "distributed"}"#,
    /// ).unwrap();
    /// assert_eq!(config.high_water_mark, 500);
    /// assert!(!config.is_local);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(settings)) => Self::from_settings(&settings),
            Ok(other) => Err(ConduitError::configuration(
                "<root>",
                format!("expected an object, got {other}"),
            )),
            Err(e) => Err(ConduitError::configuration("<root>", e.to_string())),
        }
    }

    /// Set the number of I/O threads.
    pub fn with_thread_count(mut self, threads: usize) -> Self {
        self.thread_count = threads;
        self
    }

    /// Set the linger for send-side sockets.
    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    /// Set the high water mark.
    pub fn with_high_water_mark(mut self, hwm: u64) -> Self {
        self.high_water_mark = hwm;
        self
    }

    /// Select local (IPC) or distributed (TCP) addressing.
    pub fn with_local(mut self, is_local: bool) -> Self {
        self.is_local = is_local;
        self
    }
}

fn read_int(settings: &Settings, key: &str) -> Result<Option<i64>> {
    match settings.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| {
            ConduitError::configuration(key, format!("expected an integer, got {n}"))
        }),
        Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| {
            ConduitError::configuration(key, format!("expected an integer, got {s:?}"))
        }),
        Some(other) => Err(ConduitError::configuration(
            key,
            format!("expected an integer, got {other}"),
        )),
    }
}

fn read_non_negative(settings: &Settings, key: &str) -> Result<Option<u64>> {
    read_int(settings, key)?
        .map(|value| {
            u64::try_from(value).map_err(|_| {
                ConduitError::configuration(key, format!("must not be negative, got {value}"))
            })
        })
        .transpose()
}

fn cluster_mode(settings: &Settings) -> Result<&str> {
    match settings.get(CLUSTER_MODE) {
        None | Some(Value::Null) => Ok(LOCAL_MODE),
        Some(Value::String(mode)) => Ok(mode.as_str()),
        Some(other) => Err(ConduitError::configuration(
            CLUSTER_MODE,
            format!("expected a string, got {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: Value) -> Settings {
        match value {
            Value::Object(map) => map,
            _ => panic!("settings must be an object"),
        }
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = ContextConfig::from_settings(&Settings::new()).unwrap();
        assert_eq!(config.thread_count, 1);
        assert_eq!(config.linger, Duration::from_millis(5000));
        assert_eq!(config.high_water_mark, 0);
        assert!(config.is_local);
        assert_eq!(config, ContextConfig::default());
    }

    #[test]
    fn test_explicit_values() {
        let config = ContextConfig::from_settings(&settings(json!({
            "zmq.threads": 4,
            "zmq.linger.millis": 250,
            "zmq.hwm": 10000,
            "storm.cluster.mode": "distributed",
        })))
        .unwrap();

        assert_eq!(config.thread_count, 4);
        assert_eq!(config.linger, Duration::from_millis(250));
        assert_eq!(config.high_water_mark, 10000);
        assert!(!config.is_local);
    }

    #[test]
    fn test_integer_strings_accepted() {
        let config = ContextConfig::from_settings(&settings(json!({
            "zmq.threads": "2",
            "zmq.hwm": " 7 ",
        })))
        .unwrap();
        assert_eq!(config.thread_count, 2);
        assert_eq!(config.high_water_mark, 7);
    }

    #[test]
    fn test_null_treated_as_absent() {
        let config = ContextConfig::from_settings(&settings(json!({
            "zmq.threads": null,
            "storm.cluster.mode": null,
        })))
        .unwrap();
        assert_eq!(config, ContextConfig::default());
    }

    #[test]
    fn test_cluster_mode_derivation() {
        for (mode, expected) in [("local", true), ("distributed", false), ("LOCAL", false), ("", false)] {
            let config =
                ContextConfig::from_settings(&settings(json!({ "storm.cluster.mode": mode })))
                    .unwrap();
            assert_eq!(config.is_local, expected, "mode {mode:?}");
        }
    }

    #[test]
    fn test_malformed_values_rejected() {
        let cases = [
            json!({ "zmq.threads": "many" }),
            json!({ "zmq.threads": 1.5 }),
            json!({ "zmq.threads": true }),
            json!({ "zmq.threads": 0 }),
            json!({ "zmq.threads": -2 }),
            json!({ "zmq.linger.millis": -1 }),
            json!({ "zmq.hwm": [1] }),
            json!({ "zmq.hwm": 18446744073709551615u64 }),
            json!({ "storm.cluster.mode": 1 }),
        ];
        for case in cases {
            let err = ContextConfig::from_settings(&settings(case.clone())).unwrap_err();
            assert!(err.is_configuration_error(), "{case} gave {err}");
        }
    }

    #[test]
    fn test_error_names_key() {
        let err = ContextConfig::from_settings(&settings(json!({ "zmq.hwm": "lots" }))).unwrap_err();
        match err {
            ConduitError::Configuration { key, .. } => assert_eq!(key, ZMQ_HWM),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_json_str() {
        let config = ContextConfig::from_json_str(r#"{"zmq.linger.millis": 0}"#).unwrap();
        assert_eq!(config.linger, Duration::ZERO);

        assert!(ContextConfig::from_json_str("[1, 2]")
            .unwrap_err()
            .is_configuration_error());
        assert!(ContextConfig::from_json_str("{not json")
            .unwrap_err()
            .is_configuration_error());
    }
}
