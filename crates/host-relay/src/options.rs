use std::fmt;
use std::sync::Arc;

use framerelay_context::EmbeddedFrame;
use framerelay_protocol::RelayEvent;
use framerelay_protocol::constants::ANY_ORIGIN;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Callback receiving every accepted event.
pub type EventCallback = Arc<dyn Fn(&RelayEvent) + Send + Sync>;

/// Origins the host accepts envelopes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Any origin (`"*"`).
    #[default]
    Any,
    /// Exactly these origins.
    List(Vec<String>),
}

impl AllowedOrigins {
    pub fn list<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AllowedOrigins::List(origins.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, origin: &str) -> bool {
        match self {
            AllowedOrigins::Any => true,
            AllowedOrigins::List(origins) => origins.iter().any(|o| o == origin),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOrigins {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for AllowedOrigins {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawOrigins::deserialize(deserializer)? {
            RawOrigins::One(origin) if origin == ANY_ORIGIN => AllowedOrigins::Any,
            RawOrigins::One(origin) => AllowedOrigins::List(vec![origin]),
            RawOrigins::Many(origins) => AllowedOrigins::List(origins),
        })
    }
}

impl Serialize for AllowedOrigins {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AllowedOrigins::Any => serializer.serialize_str(ANY_ORIGIN),
            AllowedOrigins::List(origins) => origins.serialize(serializer),
        }
    }
}

/// The file-configurable part of [`HostRelayOptions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRelayConfig {
    #[serde(default)]
    pub allowed_origins: AllowedOrigins,

    #[serde(default = "default_true")]
    pub forward_to_console: bool,
}

fn default_true() -> bool {
    true
}

impl Default for HostRelayConfig {
    fn default() -> Self {
        Self {
            allowed_origins: AllowedOrigins::Any,
            forward_to_console: default_true(),
        }
    }
}

/// Host-side relay options.
#[derive(Clone)]
pub struct HostRelayOptions {
    pub allowed_origins: AllowedOrigins,
    /// Accept only messages sent by the window currently loaded in this frame.
    pub iframe: Option<Arc<dyn EmbeddedFrame>>,
    /// Echo accepted events into the host console, tagged with their origin.
    pub forward_to_console: bool,
    pub on_event: Option<EventCallback>,
}

impl Default for HostRelayOptions {
    fn default() -> Self {
        HostRelayConfig::default().into()
    }
}

impl From<HostRelayConfig> for HostRelayOptions {
    fn from(config: HostRelayConfig) -> Self {
        Self {
            allowed_origins: config.allowed_origins,
            iframe: None,
            forward_to_console: config.forward_to_console,
            on_event: None,
        }
    }
}

impl HostRelayOptions {
    pub fn with_allowed_origins(mut self, origins: AllowedOrigins) -> Self {
        self.allowed_origins = origins;
        self
    }

    pub fn with_iframe(mut self, iframe: Arc<dyn EmbeddedFrame>) -> Self {
        self.iframe = Some(iframe);
        self
    }

    pub fn with_forward_to_console(mut self, forward: bool) -> Self {
        self.forward_to_console = forward;
        self
    }

    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(&RelayEvent) + Send + Sync + 'static,
    {
        self.on_event = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for HostRelayOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRelayOptions")
            .field("allowed_origins", &self.allowed_origins)
            .field("iframe", &self.iframe.is_some())
            .field("forward_to_console", &self.forward_to_console)
            .field("on_event", &self.on_event.is_some())
            .finish()
    }
}
