//! フレーズベース翻訳のデコーダー
//!
//! [`Decoder`] は語彙・フレーズテーブル・目的関数を共有で保持し、
//! 文ごとの探索は [`Worker`] が行います。
//!
//! # 例
//!
//! ```
//! use kotoba::Decoder;
//! use kotoba::phrase_table::PhraseTable;
//! use kotoba::scorer::{Objective, TableScores};
//! use kotoba::vocab::MutableVocab;
//!
//! let mut objective = Objective::new();
//! objective.add_feature(TableScores::new(1));
//! objective.set_weight(0, 1.0)?;
//!
//! let mut vocab = MutableVocab::new();
//! let table = PhraseTable::from_reader(
//!     "das Haus ||| the house ||| -1.0".as_bytes(),
//!     &mut vocab,
//!     &objective,
//! )?;
//!
//! let decoder = Decoder::new(vocab, table, objective);
//! let mut worker = decoder.new_worker();
//! worker.reset_sentence("das Haus");
//! worker.decode()?;
//! assert_eq!(worker.best().map(|t| t.text()), Some("the house"));
//! # Ok::<(), kotoba::errors::KotobaError>(())
//! ```
pub mod worker;

use std::sync::Arc;

use crate::errors::{KotobaError, Result};
use crate::phrase_table::PhraseTable;
use crate::scorer::Objective;
use crate::search::{DEFAULT_POP_LIMIT, TieBreak};
use crate::vocab::MutableVocab;

pub use crate::decoder::worker::{Translation, Worker};

/// デコードに必要な読み取り専用のデータ
pub struct Model {
    vocab: MutableVocab,
    table: PhraseTable,
    objective: Objective,
}

impl Model {
    /// 語彙を返します。
    #[inline(always)]
    pub fn vocab(&self) -> &MutableVocab {
        &self.vocab
    }

    /// フレーズテーブルを返します。
    #[inline(always)]
    pub fn table(&self) -> &PhraseTable {
        &self.table
    }

    /// 目的関数を返します。
    #[inline(always)]
    pub fn objective(&self) -> &Objective {
        &self.objective
    }
}

/// 翻訳を行うデコーダー
///
/// モデルは [`Arc`] で共有されるため、複製は安価です。
/// スレッドごとに複製して [`Worker`] を作成することで、文単位で並列に翻訳できます。
#[derive(Clone)]
pub struct Decoder {
    model: Arc<Model>,
    pop_limit: usize,
    nbest: usize,
    tie_break: TieBreak,
    detail: bool,
}

impl Decoder {
    /// 新しいデコーダーを作成します。
    ///
    /// # 引数
    ///
    /// * `vocab` - フレーズテーブル（と言語モデル）を読み込んだ語彙
    /// * `table` - フレーズテーブル
    /// * `objective` - 素性と重みを登録済みの目的関数
    pub fn new(vocab: MutableVocab, table: PhraseTable, objective: Objective) -> Self {
        Self {
            model: Arc::new(Model {
                vocab,
                table,
                objective,
            }),
            pop_limit: DEFAULT_POP_LIMIT,
            nbest: 1,
            tie_break: TieBreak::Left,
            detail: false,
        }
    }

    /// 頂点ごとのポップ上限を設定します。
    ///
    /// # エラー
    ///
    /// `pop_limit` が0の場合、エラーを返します。
    pub fn pop_limit(mut self, pop_limit: usize) -> Result<Self> {
        if pop_limit == 0 {
            return Err(KotobaError::invalid_argument(
                "pop_limit",
                "must be at least 1",
            ));
        }
        self.pop_limit = pop_limit;
        Ok(self)
    }

    /// 出力する翻訳候補の数を設定します。
    ///
    /// 候補は再結合後の完成仮説から選ばれます。状態を持つ素性（言語モデルなど）が
    /// 登録されていない場合、すべての仮説が再結合されるため候補は常に1つです。
    ///
    /// # エラー
    ///
    /// `nbest` が0の場合、エラーを返します。
    pub fn nbest(mut self, nbest: usize) -> Result<Self> {
        if nbest == 0 {
            return Err(KotobaError::invalid_argument("nbest", "must be at least 1"));
        }
        self.nbest = nbest;
        Ok(self)
    }

    /// 探索中に同じスコアの仮説を並べる順序を設定します。
    ///
    /// 再結合ではスコアが同じ場合に先に並んだ仮説が残るため、
    /// 同点の訳のどちらが選ばれるかもこの設定で決まります。
    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// 翻訳候補ごとに素性の内訳を記録するかどうかを設定します。
    pub fn detail(mut self, yes: bool) -> Self {
        self.detail = yes;
        self
    }

    /// モデルを返します。
    #[inline(always)]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// ポップ上限を返します。
    #[inline(always)]
    pub fn get_pop_limit(&self) -> usize {
        self.pop_limit
    }

    /// 出力する翻訳候補の数を返します。
    #[inline(always)]
    pub fn get_nbest(&self) -> usize {
        self.nbest
    }

    /// 同点の仮説の順序を返します。
    #[inline(always)]
    pub fn get_tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// 新しいワーカーを作成します。
    pub fn new_worker(&self) -> Worker {
        Worker::new(self.clone())
    }
}
