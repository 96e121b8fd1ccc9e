//! 局面表現モジュール
//!
//! - `Position`: 盤面配列・Bitboard・手駒・手番・状態アリーナ
//! - `StateInfo`: 手数ごとの状態（Zobristハッシュ、王手・pin情報、直前の手など）
//! - `do_move` / `undo_move` / `do_null_move`: 手の実行と巻き戻し
//! - SFEN形式の解析・出力、合法性判定、千日手判定、SEE
//!
//! 盤面配列・Bitboard・手駒・Zobristキーは `Position` のメソッドを通じて更新し、
//! 常に互いに整合しているように保つ。`verify` で再計算した値と突き合わせられる。

mod legality;
mod pos;
mod repetition;
mod see;
mod sfen;
mod state;
mod verify;
pub(crate) mod zobrist;

pub(crate) use legality::{allows_non_promotion, can_drop_on, can_promote_move};
pub use pos::{Position, DEFAULT_STATE_CAPACITY};
pub use sfen::{SfenError, SFEN_HIRATE};
pub use state::StateInfo;
pub use verify::StateMismatch;
pub use zobrist::{zobrist_hand, zobrist_psq, zobrist_side};
