//! Default constants for gallery configuration
//!
//! Everything that is configurable has its default here.

// ============================================================================
// HOSTS & PORTS
// ============================================================================

/// Default listener host (localhost only)
pub const DEFAULT_LISTENER_HOST: &str = "127.0.0.1";

/// Default listener port (0 = ephemeral)
pub const DEFAULT_LISTENER_PORT: u16 = 0;

// ============================================================================
// ENVIRONMENT VARIABLES
// ============================================================================

/// Listener host override
pub const ENV_GALLERY_HOST: &str = "GALLERY_HOST";

/// Listener port override
pub const ENV_GALLERY_PORT: &str = "GALLERY_PORT";

/// Registration timeout override (milliseconds)
pub const ENV_GALLERY_REGISTRATION_TIMEOUT_MS: &str = "GALLERY_REGISTRATION_TIMEOUT_MS";

/// RPC request timeout override (milliseconds)
pub const ENV_GALLERY_REQUEST_TIMEOUT_MS: &str = "GALLERY_REQUEST_TIMEOUT_MS";

/// Tool endpoint (`host:port`) the app side dials
pub const ENV_GALLERY_TOOL_ENDPOINT: &str = "GALLERY_TOOL_ENDPOINT";

/// Config file path override (CLI)
pub const ENV_GALLERY_CONFIG: &str = "GALLERY_CONFIG";

// ============================================================================
// TIMEOUTS
// ============================================================================

/// Window for an accepted socket to send `registerApp`
pub const DEFAULT_REGISTRATION_TIMEOUT_MS: u64 = 10_000;

/// Per-call RPC timeout
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Outbound dial timeout
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Delay before a disconnected app is removed under the grace-period policy
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 30_000;

// ============================================================================
// LIMITS & CAPACITIES
// ============================================================================

/// Maximum accepted frame body (16 MiB)
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Broadcast channel capacity for app events
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// SCANNER
// ============================================================================

/// Assembly name prefixes skipped by the default exclusion filter
pub const DEFAULT_EXCLUDED_ASSEMBLY_PREFIXES: &[&str] = &[
    "System.",
    "Microsoft.",
    "mscorlib",
    "netstandard",
    "WindowsBase",
    "PresentationCore",
    "PresentationFramework",
    "Avalonia.",
];

// ============================================================================
// FILES
// ============================================================================

/// Default config file name (CLI)
pub const DEFAULT_CONFIG_FILENAME: &str = "gallery.toml";
