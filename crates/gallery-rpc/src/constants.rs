//! RPC protocol constants
//!
//! Method names are part of the wire contract; both peers must agree on them.

/// Method names
pub mod methods {
    // App -> tool

    /// First call on every connection; announces project path and platform
    pub const REGISTER_APP: &str = "registerApp";
    /// The app published a new catalog (hot reload)
    pub const NOTIFY_CATALOG_CHANGED: &str = "notifyCatalogChanged";

    // Tool -> app

    /// Render a preview in the running app
    pub const NAVIGATE_TO_PREVIEW: &str = "navigateToPreview";
    /// Ordered preview keys of one component
    pub const GET_PREVIEWS_FOR_COMPONENT: &str = "getPreviewsForComponent";
    /// Full serialized catalog
    pub const GET_CATALOG: &str = "getCatalog";
    /// Rendered image of a preview
    pub const GET_PREVIEW_SNAPSHOT: &str = "getPreviewSnapshot";
}

/// Framing header carrying the body length in bytes
pub const CONTENT_LENGTH_HEADER: &str = "Content-Length:";

/// Longest header line accepted before the frame is rejected
pub const MAX_HEADER_LINE_BYTES: usize = 1024;
