//! Shared proptest configurations
//!
//! ```rust,ignore
//! use gallery_testing::proptest_config;
//!
//! proptest! {
//!     #![proptest_config(proptest_config::auto_config())]
//!
//!     #[test]
//!     fn categories_partition_components(graph in component_graph()) {
//!         // ...
//!     }
//! }
//! ```
//!
//! `PROPTEST_CASES` controls thoroughness: 64 for quick runs, thousands for
//! nightly ones.

use proptest::prelude::*;

/// Small case count for fast feedback
pub fn ci_config() -> ProptestConfig {
    ProptestConfig {
        cases: 64,
        max_shrink_iters: 100,
        ..ProptestConfig::default()
    }
}

pub fn nightly_config() -> ProptestConfig {
    ProptestConfig {
        cases: 5000,
        max_shrink_iters: 10000,
        ..ProptestConfig::default()
    }
}

/// Case count from `PROPTEST_CASES`, 256 when unset
pub fn auto_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(256);

    ProptestConfig {
        cases,
        ..ProptestConfig::default()
    }
}
