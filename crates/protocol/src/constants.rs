/// Discriminator carried in every envelope's `kind` field.
///
/// Distinguishes relay traffic from unrelated messages sharing the channel.
pub const RELAY_KIND: &str = "IFRAME_CONSOLE_RELAY";

/// Emitted in place of a value that is already being serialized.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Emitted in place of a field that could not be read or serialized.
pub const UNSERIALIZABLE_MARKER: &str = "[Unserializable]";

/// Value of the `__type` field on serialized error records.
pub const ERROR_TYPE_MARKER: &str = "Error";

/// JSON key holding [`ERROR_TYPE_MARKER`].
pub const ERROR_TYPE_KEY: &str = "__type";

/// Suffix appended to the decimal text of big integers.
pub const BIGINT_SUFFIX: &str = "n";

/// Name used for functions without one.
pub const ANONYMOUS_FUNCTION: &str = "anonymous";

/// Name used for UI nodes whose node name is empty or unreadable.
pub const DEFAULT_NODE_NAME: &str = "Node";

/// Wildcard accepted as a target origin or an allow-list.
pub const ANY_ORIGIN: &str = "*";

/// Message of the synthetic error built for uncaught non-`Error` payloads.
pub const DEFAULT_SCRIPT_ERROR: &str = "Script error";

/// Prefix for messages the relay itself prints to a console.
pub const ADVISORY_PREFIX: &str = "[iframe-console-relay]";

/// Console log level bitmask: `log` messages.
pub const LEVEL_LOG: u32 = 1;
/// Console log level bitmask: `warn` messages.
pub const LEVEL_WARN: u32 = 2;
/// Console log level bitmask: `error` messages.
pub const LEVEL_ERROR: u32 = 4;
/// Console log level bitmask: `info` messages.
pub const LEVEL_INFO: u32 = 8;
/// Console log level bitmask: `debug` messages.
pub const LEVEL_DEBUG: u32 = 16;
/// Console log level bitmask: `trace` messages.
pub const LEVEL_TRACE: u32 = 32;
/// Every level.
pub const LEVEL_ALL: u32 =
    LEVEL_LOG | LEVEL_WARN | LEVEL_ERROR | LEVEL_INFO | LEVEL_DEBUG | LEVEL_TRACE;

/// Maps a console level name to its bitmask bit. Returns 0 for unknown levels.
pub fn level_bit(level: &str) -> u32 {
    match level {
        "log" => LEVEL_LOG,
        "warn" => LEVEL_WARN,
        "error" => LEVEL_ERROR,
        "info" => LEVEL_INFO,
        "debug" => LEVEL_DEBUG,
        "trace" => LEVEL_TRACE,
        _ => 0,
    }
}
