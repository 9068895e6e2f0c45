//! 言語モデルのインターフェース
//!
//! 探索コアは言語モデルを [`LanguageModel`] トレイトを通してのみ利用します。
//! スコアは文脈状態 [`LmState`] を引き継ぎながら増分的に計算されます。
//! 参照実装として ARPA テキストを読み込む [`BackoffModel`] を提供します。

mod backoff;

use crate::vocab::WordIndex;

pub use crate::lm::backoff::BackoffModel;

/// サポートする最大のn-gram次数
pub const MAX_ORDER: usize = 6;

/// 言語モデルの文脈状態
///
/// 直近の単語を新しい順に最大 `MAX_ORDER - 1` 語保持します。
/// 等しい状態からの将来のスコアは等しくなるため、仮説の再結合に使われます。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LmState {
    words: [WordIndex; MAX_ORDER - 1],
    length: u8,
}

impl LmState {
    /// 空の文脈を返します。
    pub const fn empty() -> Self {
        Self {
            words: [0; MAX_ORDER - 1],
            length: 0,
        }
    }

    /// 新しい順に並んだ単語列から状態を作成します。
    ///
    /// 最大長を超えた古い単語は捨てられます。
    pub fn from_words(newest_first: &[WordIndex]) -> Self {
        let mut state = Self::empty();
        let len = newest_first.len().min(MAX_ORDER - 1);
        state.words[..len].copy_from_slice(&newest_first[..len]);
        state.length = len as u8;
        state
    }

    /// 新しい順の文脈単語列を返します。
    #[inline(always)]
    pub fn words(&self) -> &[WordIndex] {
        &self.words[..usize::from(self.length)]
    }

    /// 文脈の語数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        usize::from(self.length)
    }

    /// 文脈が空の場合に `true` を返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// `word` を先頭に加え、新しい順に `keep` 語だけ残した状態を返します。
    pub fn extend(&self, word: WordIndex, keep: usize) -> Self {
        let keep = keep.min(MAX_ORDER - 1).min(self.len() + 1);
        let mut state = Self::empty();
        if keep > 0 {
            state.words[0] = word;
            state.words[1..keep].copy_from_slice(&self.words[..keep - 1]);
        }
        state.length = keep as u8;
        state
    }
}

/// 探索コアが利用する言語モデル
///
/// スコアは常用対数の確率です。単語IDはデコーダ側の語彙のIDで渡されます。
pub trait LanguageModel: Send + Sync {
    /// n-gramの次数を返します。
    fn order(&self) -> usize;

    /// 文頭 `<s>` の直後を表す状態を返します。
    fn begin_sentence_state(&self) -> LmState;

    /// 文脈のない状態を返します。
    fn null_context_state(&self) -> LmState {
        LmState::empty()
    }

    /// 1語をスコアリングし、スコアと次の状態を返します。
    fn score_word(&self, state: &LmState, word: WordIndex) -> (f32, LmState);

    /// 文末 `</s>` のスコアを返します。
    fn score_end_sentence(&self, state: &LmState) -> f32;

    /// 単語列を順にスコアリングし、合計スコアと最後の状態を返します。
    fn score_words(&self, state: &LmState, words: &[WordIndex]) -> (f32, LmState) {
        let mut total = 0.0;
        let mut state = *state;
        for &word in words {
            let (score, next) = self.score_word(&state, word);
            total += score;
            state = next;
        }
        (total, state)
    }
}
