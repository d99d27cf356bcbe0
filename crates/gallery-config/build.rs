//! Build script for gallery-config
//!
//! Embeds the default config template (`gallery.toml` at the workspace root)
//! so `gallery init` can write it without shipping a separate file.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let workspace_root = PathBuf::from(&manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .expect("Could not find workspace root")
        .to_path_buf();

    let default_config_path = workspace_root.join("gallery.toml");

    let default_config = fs::read_to_string(&default_config_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read default config at {}: {}",
            default_config_path.display(),
            e
        )
    });

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let dest_path = PathBuf::from(&out_dir).join("embedded_configs.rs");

    let content = format!(
        r####"/// Default configuration template embedded at compile time
/// Source: gallery.toml (workspace root)
pub const DEFAULT_CONFIG: &str = r###"{}"###;
"####,
        default_config
    );

    fs::write(&dest_path, content).expect("Could not write embedded_configs.rs");

    println!("cargo:rerun-if-changed={}", default_config_path.display());
    println!("cargo:rerun-if-changed=build.rs");
}
