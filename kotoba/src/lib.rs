//! # Kotoba
//!
//! Kotobaは、キューブ枝刈りに基づくフレーズベース統計的機械翻訳のデコーダーです。
//!
//! ## 概要
//!
//! 入力文の各区間をフレーズテーブルで引いて探索グラフを構築し、
//! 左から右へ単調に訳を組み立てます。各頂点ではキューブ枝刈りにより
//! 見積もりの高い組み合わせから順に仮説を生成し、ポップ上限で打ち切ります。
//!
//! ## 主な機能
//!
//! - **語彙**: 単語文字列と整数IDの相互変換（可変語彙と、文ごとの上書き語彙）
//! - **フレーズテーブル**: `原言語 ||| 目的言語 ||| スコア` 形式の読み込みと検索
//! - **目的関数**: 素性の登録と重み付きスコアリング（言語モデル、ペナルティ等）
//! - **言語モデル**: ARPA形式のバックオフ n-gram モデル
//! - **探索**: キューブ枝刈りと仮説の再結合
//! - **N-best出力**: 複数の翻訳候補と素性の内訳
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kotoba::Decoder;
//! use kotoba::phrase_table::PhraseTable;
//! use kotoba::scorer::{Objective, Passthrough, TableScores};
//! use kotoba::vocab::MutableVocab;
//!
//! let mut objective = Objective::new();
//! objective.add_feature(TableScores::new(1));
//! objective.add_feature(Passthrough);
//! objective.set_weight(0, 1.0)?;
//! objective.set_weight(1, -10.0)?;
//!
//! let table_text = "das ||| the ||| -0.2
//! das Haus ||| the house ||| -0.5
//! ist ||| is ||| -0.1";
//! let mut vocab = MutableVocab::new();
//! let table = PhraseTable::from_reader(table_text.as_bytes(), &mut vocab, &objective)?;
//!
//! let decoder = Decoder::new(vocab, table, objective).detail(true);
//! let mut worker = decoder.new_worker();
//!
//! worker.reset_sentence("das Haus ist klein");
//! worker.decode()?;
//!
//! let best = worker.best().unwrap();
//! assert_eq!(best.text(), "the house is klein");
//! assert_eq!(best.score(), -10.6);
//! assert_eq!(best.features().unwrap().dense(), &[-0.6, 1.0]);
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// 固定容量アロケータとフレーズプール
pub mod alloc;

/// デコーダーとワーカー
pub mod decoder;

/// エラー型の定義
pub mod errors;

/// 言語モデル
pub mod lm;

/// 導出木の組み立てと出力
pub mod output;

/// フレーズテーブル
pub mod phrase_table;

/// 素性と目的関数
pub mod scorer;

/// 探索グラフとキューブ枝刈り
pub mod search;

/// 内部ユーティリティ関数
pub mod utils;

/// 語彙
pub mod vocab;


// Re-exports
pub use decoder::{Decoder, Translation, Worker};
pub use phrase_table::{PhraseTable, PhraseTableBuilder};
pub use scorer::{Objective, Weights};

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
