//! 将棋エンジンのコアライブラリ
//!
//! 局面表現・合法手生成・SEE・1手詰め判定・置換表・指し手オーダリングを提供する。
//! 探索ドライバ・評価関数・USIプロトコル層はこのクレートの外側にあり、
//! ここで公開される型と関数を通じてコアを利用する。
//!
//! 使用前に [`init`] を一度呼び出してZobristテーブルと利きテーブルを構築すること。
//! （`Position` の構築時にも呼ばれるため、明示的な呼び出しは任意）

pub mod bitboard;
pub mod config;
mod init;
pub mod mate;
pub mod movegen;
pub mod movepick;
pub mod position;
pub mod tt;
pub mod types;

pub use config::{CoreOptions, OptionsError};
pub use init::init;
pub use position::{Position, SfenError, StateInfo, SFEN_HIRATE};
pub use types::{Color, File, Hand, Move, Piece, PieceType, Rank, RepetitionState, Square, Value};
