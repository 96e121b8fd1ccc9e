pub mod io;

use std::path::Path;

use anyhow::{Context, Result};
use shogi_core::CoreOptions;

/// ログ出力を初期化（`RUST_LOG` 未指定なら info）
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
}

/// TOML のオプションファイルを読む。指定がなければ既定値
pub fn load_options(path: Option<&Path>) -> Result<CoreOptions> {
    let Some(path) = path else {
        return Ok(CoreOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let opts = CoreOptions::from_toml_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    log::info!("loaded options from {}: {:?}", path.display(), opts);
    Ok(opts)
}
