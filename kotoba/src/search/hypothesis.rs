use crate::alloc::Phrase;
use crate::lm::LmState;
use crate::phrase_table::ScoreSpan;
use crate::search::{EdgeId, MAX_ARITY};

/// 仮説の由来
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum History {
    /// 何も翻訳していない文頭の仮説
    Start,

    /// フレーズテーブルまたは素通しによる目的言語フレーズ
    Phrase {
        /// 目的言語フレーズ
        phrase: Phrase,
        /// フレーズテーブル上のスコア欄の位置
        scores: ScoreSpan,
    },

    /// エッジの適用による導出
    Derivation {
        /// 適用したエッジ
        edge: EdgeId,
        /// 各子頂点で選んだ仮説の位置
        children: [u32; MAX_ARITY],
    },
}

/// スコア付きの翻訳候補
///
/// 生成後は変更されません。スコアは大きいほど良い値です。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hypothesis {
    score: f32,
    state: LmState,
    history: History,
}

impl Hypothesis {
    /// 新しい仮説を作成します。
    #[inline(always)]
    pub const fn new(score: f32, state: LmState, history: History) -> Self {
        Self {
            score,
            state,
            history,
        }
    }

    /// スコアを返します。
    #[inline(always)]
    pub const fn score(&self) -> f32 {
        self.score
    }

    /// 言語モデルの状態を返します。
    #[inline(always)]
    pub const fn state(&self) -> &LmState {
        &self.state
    }

    /// 由来を返します。
    #[inline(always)]
    pub const fn history(&self) -> &History {
        &self.history
    }
}
