//! 置換表と MovePicker を探索ドライバのように組み合わせる結合テスト

use shogi_core::movegen::{generate_legal, MoveList};
use shogi_core::movepick::{HistoryTables, MovePicker};
use shogi_core::tt::TranspositionTable;
use shogi_core::types::{Bound, Move, Value};
use shogi_core::{CoreOptions, Position};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 置換表の手を MovePicker に渡すと最初に返り、合法手は全て1回ずつ返る
#[test]
fn test_tt_move_feeds_move_picker() {
    init_logger();
    let opts = CoreOptions::from_toml_str("hash_mb = 1").unwrap();
    let tt = TranspositionTable::with_options(&opts).unwrap();
    let history = HistoryTables::new_boxed();

    let mut pos = Position::startpos();
    for usi in ["7g7f", "3c3d", "8h2b+"] {
        let m = pos.move_from_usi(usi).unwrap();
        let gc = pos.gives_check(m);
        pos.do_move(m, gc);
    }
    // 後手番。3一の銀で2二の馬を取る手を置換表に入れる
    let best = pos.move_from_usi("3a2b").unwrap();
    tt.probe(pos.key()).write(Value::new(300), true, Bound::Exact, 8, best, Value::ZERO, tt.generation());

    let probe = tt.probe(pos.key());
    assert!(probe.found);
    let mut mp = MovePicker::new(&pos, probe.data.mv, 8, [Move::NONE; 2], &history, opts.generate_all_legal_moves);

    let mut returned = Vec::new();
    loop {
        let m = mp.next_move(&pos, &history);
        if m.is_none() {
            break;
        }
        if pos.is_legal(m) {
            returned.push(m.to_u16());
        }
    }
    assert_eq!(returned[0], best.to_u16(), "置換表の手が最初");

    let mut legal = MoveList::new();
    generate_legal(&pos, &mut legal);
    let mut expected: Vec<u16> = legal.iter().map(|m| m.to_u16()).collect();
    expected.sort_unstable();
    let mut got = returned.clone();
    got.sort_unstable();
    assert_eq!(got, expected, "MovePicker は合法手を過不足なく返す");
}

/// 複数スレッドから同時に読み書きしても壊れない（読めた手は検証してから使う）
#[test]
fn test_tt_concurrent_access() {
    init_logger();
    let tt = TranspositionTable::new(1).unwrap();
    let pos = Position::startpos();
    let mut list = MoveList::new();
    generate_legal(&pos, &mut list);
    let moves: Vec<Move> = list.iter().copied().collect();

    std::thread::scope(|scope| {
        for t in 0..4u64 {
            let tt = &tt;
            let moves = &moves;
            let pos = pos.clone();
            scope.spawn(move || {
                for i in 0..20_000u64 {
                    let key = (i % 512).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ t;
                    let probe = tt.probe(key);
                    if probe.found {
                        if let Some(m) = pos.to_move(probe.data.mv) {
                            let _ = pos.pseudo_legal(m);
                        }
                    }
                    let m = moves[(i as usize) % moves.len()];
                    probe.write(Value::new(i as i32 % 1000), false, Bound::Lower, (i % 20) as i32, m, Value::ZERO, 0);
                }
            });
        }
    });

    assert!(tt.hashfull(0) > 0);
}
