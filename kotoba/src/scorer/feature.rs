use crate::lm::LmState;
use crate::scorer::ScoreCollector;
use crate::search::Hypothesis;
use crate::vocab::WordIndex;

/// 目的言語フレーズの出自
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetPhraseType {
    /// フレーズテーブルの行から作られたフレーズ
    Table,
    /// 翻訳できない原言語の単語をそのまま写したフレーズ
    Passthrough,
}

/// 単独でスコアリングされる目的言語フレーズ
#[derive(Clone, Copy, Debug)]
pub struct TargetPhraseInfo<'a> {
    /// 目的言語の単語ID列
    pub words: &'a [WordIndex],
    /// フレーズの出自
    pub kind: TargetPhraseType,
    /// フレーズテーブルに記載されたスコア
    pub scores: &'a [f32],
}

/// 入力文中の原言語フレーズ
#[derive(Clone, Copy, Debug)]
pub struct SourcePhrase<'a> {
    sentence: &'a [WordIndex],
    begin: usize,
    end: usize,
}

impl<'a> SourcePhrase<'a> {
    /// 入力文 `sentence` の区間 `[begin, end)` を表す原言語フレーズを作成します。
    ///
    /// # パニック
    ///
    /// 区間が入力文の範囲外の場合、パニックします。
    pub fn new(sentence: &'a [WordIndex], begin: usize, end: usize) -> Self {
        assert!(begin <= end && end <= sentence.len());
        Self {
            sentence,
            begin,
            end,
        }
    }

    /// 区間内の単語ID列を返します。
    #[inline(always)]
    pub fn words(&self) -> &'a [WordIndex] {
        &self.sentence[self.begin..self.end]
    }

    /// 区間を返します。
    #[inline(always)]
    pub const fn span(&self) -> (usize, usize) {
        (self.begin, self.end)
    }

    /// 区間の語数を返します。
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.end - self.begin
    }

    /// 区間が空の場合に `true` を返します。
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

/// 原言語フレーズとその訳の組
#[derive(Clone, Copy, Debug)]
pub struct PhrasePair<'a> {
    /// 原言語フレーズ
    pub source: SourcePhrase<'a>,
    /// 目的言語の単語ID列
    pub target: &'a [WordIndex],
}

/// 素性の登録時に共有される初期化情報
#[derive(Clone, Debug, Default)]
pub struct FeatureInit {
    /// 文頭の言語モデル状態
    pub begin_sentence_state: LmState,
    /// 次に登録される素性が読むスコア欄の先頭位置
    pub table_score_offset: usize,
}

/// 素性関数
///
/// 各素性は登録時に連続した密素性スロットを割り当てられ、
/// 4つのスコアリング文脈のそれぞれで値を [`ScoreCollector`] に書き込みます。
///
/// 1. [`score_target_phrase`](Self::score_target_phrase): フレーズ単独
/// 2. [`score_hypothesis_with_source_phrase`](Self::score_hypothesis_with_source_phrase):
///    仮説と新しい原言語フレーズの組み合わせ
/// 3. [`score_hypothesis_with_phrase_pair`](Self::score_hypothesis_with_phrase_pair):
///    仮説とフレーズ対の組み合わせ
/// 4. [`score_final_hypothesis`](Self::score_final_hypothesis): 文末での再スコアリング
pub trait Feature: Send + Sync {
    /// 素性の名前を返します。
    fn name(&self) -> &str;

    /// 登録時に一度だけ呼ばれます。
    fn init(&mut self, _init: &mut FeatureInit) {}

    /// フレーズを単独でスコアリングします。
    fn score_target_phrase(
        &self,
        target: TargetPhraseInfo<'_>,
        collector: &mut ScoreCollector<'_>,
    );

    /// 仮説に原言語フレーズを加えるときのスコアを計算します。
    fn score_hypothesis_with_source_phrase(
        &self,
        _hypothesis: &Hypothesis,
        _source: SourcePhrase<'_>,
        _collector: &mut ScoreCollector<'_>,
    ) {
    }

    /// 仮説にフレーズ対を加えるときのスコアを計算します。
    fn score_hypothesis_with_phrase_pair(
        &self,
        _hypothesis: &Hypothesis,
        _pair: PhrasePair<'_>,
        _collector: &mut ScoreCollector<'_>,
    ) {
    }

    /// 完成した仮説を文末で再スコアリングします。
    fn score_final_hypothesis(
        &self,
        _hypothesis: &Hypothesis,
        _collector: &mut ScoreCollector<'_>,
    ) {
    }

    /// 2つの仮説がこの素性にとって区別できない場合に `true` を返します。
    fn hypothesis_equal(&self, _first: &Hypothesis, _second: &Hypothesis) -> bool {
        true
    }

    /// この素性が使う密素性スロットの数を返します。
    fn dense_feature_count(&self) -> usize;

    /// 密素性スロット `index` の説明を返します。
    fn feature_description(&self, index: usize) -> String;

    /// フレーズテーブルのスコア欄から読む値の数を返します。
    fn table_score_count(&self) -> usize {
        0
    }
}
