//! perft（合法手の経路数）を数える
//!
//! 既定では不成も含めた合法手で数える。オプションファイルの `generate_all_legal_moves`
//! または `--all-moves false` で探索用の生成（歩・角・飛の不成などを省く）に切り替える。
//! `--divide` を付けると初手ごとの内訳を出す。
//!
//! 使用例:
//!   cargo run --release -p tools --bin perft -- --depth 4
//!   cargo run --release -p tools --bin perft -- --sfen "4k4/9/9/9/9/9/9/9/4K4 b G 1" --depth 3 --divide

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use shogi_core::movegen::{perft_divide_with, perft_with};
use shogi_core::{Position, SFEN_HIRATE};
use tools::common::{init_logger, load_options};

#[derive(Parser, Debug)]
#[command(name = "perft")]
#[command(about = "指定局面から depth 手先までの合法手の経路数を数える")]
struct Cli {
    /// 開始局面（省略時は平手）
    #[arg(long, default_value = SFEN_HIRATE)]
    sfen: String,

    /// 探索深さ
    #[arg(short, long, default_value_t = 3)]
    depth: u32,

    /// 初手ごとの内訳を表示
    #[arg(long, default_value_t = false)]
    divide: bool,

    /// 不成も含めて数えるか（省略時はオプションファイルの値、それもなければ true）
    #[arg(long)]
    all_moves: Option<bool>,

    /// オプションファイル（TOML）
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();
    let all = match (cli.all_moves, &cli.config) {
        (Some(all), _) => all,
        (None, Some(path)) => load_options(Some(path.as_path()))?.generate_all_legal_moves,
        (None, None) => true,
    };

    let mut pos = Position::from_sfen(&cli.sfen).with_context(|| format!("invalid sfen: {}", cli.sfen))?;
    log::info!("perft depth {} (all moves: {}) from {}", cli.depth, all, pos.to_sfen());

    let start = Instant::now();
    let nodes = if cli.divide {
        let mut total = 0;
        for (m, n) in perft_divide_with(&mut pos, cli.depth, all) {
            println!("{}: {}", m.to_usi(), n);
            total += n;
        }
        total
    } else {
        perft_with(&mut pos, cli.depth, all)
    };
    let elapsed = start.elapsed();

    println!("nodes {nodes}");
    let nps = nodes as f64 / elapsed.as_secs_f64().max(1e-9);
    log::info!("elapsed {:.3}s ({:.0} nps)", elapsed.as_secs_f64(), nps);
    Ok(())
}
