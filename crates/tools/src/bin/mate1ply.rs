//! 1手詰め判定を SFEN の一覧に対して実行する
//!
//! 入力は `--sfen` で直接与えるか、`--input` で1行1局面のファイル（`-` で標準入力、`.gz` 可）を与える。
//! `--verify` を付けると全合法手を指して確かめた結果と突き合わせる。
//!
//! 使用例:
//!   cargo run --release -p tools --bin mate1ply -- --sfen "4k4/9/4P4/9/9/9/9/9/4K4 b G 1"
//!   cargo run --release -p tools --bin mate1ply -- --input positions.sfen.gz --verify

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use shogi_core::movegen::{generate_legal, generate_legal_all, MoveList};
use shogi_core::Position;
use tools::common::io::{open_reader, read_sfen_lines};
use tools::common::{init_logger, load_options};

#[derive(Parser, Debug)]
#[command(name = "mate1ply")]
#[command(about = "SFEN の局面ごとに1手詰めの手を探す")]
struct Cli {
    /// 局面（複数指定可）
    #[arg(long)]
    sfen: Vec<String>,

    /// 1行1局面の SFEN ファイル
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// 全合法手を指して確かめる
    #[arg(long, default_value_t = false)]
    verify: bool,

    /// 確認に不成も含めた合法手を使うか（省略時はオプションファイルの値、それもなければ true）
    #[arg(long)]
    all_moves: Option<bool>,

    /// オプションファイル（TOML）
    #[arg(long)]
    config: Option<PathBuf>,
}

/// 全合法手を指して、指した後に詰んでいる王手があるか
fn brute_force_mate(pos: &Position, all: bool) -> bool {
    let mut list = MoveList::new();
    if all {
        generate_legal_all(pos, &mut list);
    } else {
        generate_legal(pos, &mut list);
    }
    list.iter().any(|&m| {
        let mut after = pos.clone();
        let gives_check = after.gives_check(m);
        after.do_move(m, gives_check);
        gives_check && after.is_mate()
    })
}

fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();
    let all = match (cli.all_moves, &cli.config) {
        (Some(all), _) => all,
        (None, Some(path)) => load_options(Some(path.as_path()))?.generate_all_legal_moves,
        (None, None) => true,
    };

    let mut sfens = cli.sfen.clone();
    if let Some(path) = &cli.input {
        let reader = open_reader(path).with_context(|| format!("failed to open {}", path.display()))?;
        sfens.extend(read_sfen_lines(reader)?);
    }
    if sfens.is_empty() {
        bail!("no positions given (use --sfen or --input)");
    }

    let start = Instant::now();
    let mut found = 0usize;
    let mut mismatches = 0usize;
    for (i, sfen) in sfens.iter().enumerate() {
        let pos = Position::from_sfen(sfen).with_context(|| format!("invalid sfen at #{}: {}", i + 1, sfen))?;
        let mate = pos.mate_1ply();
        match mate {
            Some(m) => {
                found += 1;
                println!("{}\t{}", sfen, m.to_usi());
            }
            None => println!("{sfen}\tnone"),
        }

        if cli.verify && !pos.in_check() {
            let expected = brute_force_mate(&pos, all);
            if expected != mate.is_some() {
                mismatches += 1;
                log::warn!("mismatch at #{}: solver={:?} brute_force={}", i + 1, mate.map(|m| m.to_usi()), expected);
            }
        }
    }

    log::info!(
        "{} positions, {} mates, {:.3}s",
        sfens.len(),
        found,
        start.elapsed().as_secs_f64()
    );
    if mismatches > 0 {
        bail!("{mismatches} positions disagreed with the brute force check");
    }
    Ok(())
}
