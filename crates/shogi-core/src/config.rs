//! コアのオプション設定
//!
//! 探索ドライバの「オプション取得」インターフェースが参照する値をまとめる。
//! TOMLから読み込むか、`Default` の値をそのまま使う。

use serde::Deserialize;
use thiserror::Error;

/// オプション読み込みエラー
#[derive(Debug, Error)]
pub enum OptionsError {
    /// TOMLの構文・型エラー
    #[error("invalid options: {0}")]
    Parse(#[from] toml::de::Error),
    /// 値の範囲外
    #[error("option `{name}` out of range: {value}")]
    OutOfRange { name: &'static str, value: u64 },
}

/// コアが参照するオプション
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreOptions {
    /// 置換表サイズ（MB）
    pub hash_mb: usize,
    /// 千日手判定で遡る最大手数
    pub repetition_max_ply: u32,
    /// 探索用の指し手生成で不成も含めるか
    pub generate_all_legal_moves: bool,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            hash_mb: 16,
            repetition_max_ply: 16,
            generate_all_legal_moves: false,
        }
    }
}

impl CoreOptions {
    /// TOML文字列から読み込む（未指定のキーはデフォルト値）
    pub fn from_toml_str(s: &str) -> Result<Self, OptionsError> {
        let opts: CoreOptions = toml::from_str(s)?;
        opts.validate()?;
        Ok(opts)
    }

    /// 値の範囲をチェック
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.hash_mb == 0 {
            return Err(OptionsError::OutOfRange {
                name: "hash_mb",
                value: 0,
            });
        }
        if self.repetition_max_ply == 0 {
            return Err(OptionsError::OutOfRange {
                name: "repetition_max_ply",
                value: 0,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = CoreOptions::default();
        assert_eq!(opts.hash_mb, 16);
        assert_eq!(opts.repetition_max_ply, 16);
        assert!(!opts.generate_all_legal_moves);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let opts = CoreOptions::from_toml_str("hash_mb = 64\n").unwrap();
        assert_eq!(opts.hash_mb, 64);
        assert_eq!(opts.repetition_max_ply, 16, "未指定のキーはデフォルト値のはず");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            CoreOptions::from_toml_str("threads = 4\n"),
            Err(OptionsError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_hash_rejected() {
        assert!(matches!(
            CoreOptions::from_toml_str("hash_mb = 0\n"),
            Err(OptionsError::OutOfRange { name: "hash_mb", .. })
        ));
    }
}
