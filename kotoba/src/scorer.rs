//! 素性とスコアリング
//!
//! [`Objective`] は登録された素性の順序付きリストを保持し、
//! 各素性に連続した密素性スロットを割り当てます。
//! スコアは密な重みベクトルと素性値の内積に、疎な素性の寄与を加えたものです。
//!
//! スコアリングは次の4つの文脈で行われます。
//!
//! | 文脈 | メソッド |
//! |---|---|
//! | (a) フレーズ単独 | [`Objective::score_phrase`] |
//! | (b) 仮説 + 原言語フレーズ | [`Objective::score_hypothesis_with_source_phrase`] |
//! | (c) 仮説 + フレーズ対 | [`Objective::score_hypothesis_with_phrase_pair`] |
//! | (d) 文末の再スコアリング | [`Objective::rescore_hypothesis`] |
//!
//! いずれも任意の [`FeatureStore`] を受け取り、素性ごとの値を記録できます。

mod feature;
mod lm_feature;
mod passthrough;
mod penalty;
mod table_scores;
mod weights;

use hashbrown::HashMap;

use crate::errors::{KotobaError, Result};
use crate::lm::LmState;
use crate::search::Hypothesis;

pub use crate::scorer::feature::{
    Feature, FeatureInit, PhrasePair, SourcePhrase, TargetPhraseInfo, TargetPhraseType,
};
pub use crate::scorer::lm_feature::LanguageModelFeature;
pub use crate::scorer::passthrough::Passthrough;
pub use crate::scorer::penalty::{PhrasePenalty, WordPenalty};
pub use crate::scorer::table_scores::TableScores;
pub use crate::scorer::weights::Weights;

/// 素性ごとの値の記録
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureStore {
    dense: Vec<f32>,
    sparse: HashMap<String, f32>,
}

impl FeatureStore {
    /// 密素性の数を指定して、すべて0の記録を作成します。
    pub fn new(dense_count: usize) -> Self {
        Self {
            dense: vec![0.0; dense_count],
            sparse: HashMap::new(),
        }
    }

    /// 密素性の値を返します。
    #[inline(always)]
    pub fn dense(&self) -> &[f32] {
        &self.dense
    }

    /// 疎な素性の値を返します。
    #[inline(always)]
    pub fn sparse(&self) -> &HashMap<String, f32> {
        &self.sparse
    }
}

/// 素性がスコアを書き込む先
///
/// 値は重み付けされて合計スコアに加算され、記録先があればそこにも加算されます。
pub struct ScoreCollector<'a> {
    weights: &'a [f32],
    sparse_weights: &'a HashMap<String, f32>,
    offset: usize,
    score: f32,
    state: Option<LmState>,
    store: Option<&'a mut FeatureStore>,
}

impl<'a> ScoreCollector<'a> {
    fn new(
        weights: &'a [f32],
        sparse_weights: &'a HashMap<String, f32>,
        store: Option<&'a mut FeatureStore>,
    ) -> Self {
        Self {
            weights,
            sparse_weights,
            offset: 0,
            score: 0.0,
            state: None,
            store,
        }
    }

    #[inline(always)]
    fn set_dense_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// 現在の素性の `index` 番目の密素性に値を加えます。
    #[inline(always)]
    pub fn add_dense(&mut self, index: usize, value: f32) {
        let slot = self.offset + index;
        self.score += self.weights[slot] * value;
        if let Some(store) = self.store.as_deref_mut() {
            store.dense[slot] += value;
        }
    }

    /// 名前付きの疎な素性に値を加えます。
    pub fn add_sparse(&mut self, name: &str, value: f32) {
        if let Some(&weight) = self.sparse_weights.get(name) {
            self.score += weight * value;
        }
        if let Some(store) = self.store.as_deref_mut() {
            *store.sparse.entry_ref(name).or_insert(0.0) += value;
        }
    }

    /// 新しい仮説の言語モデル状態を設定します。
    #[inline(always)]
    pub fn set_state(&mut self, state: LmState) {
        self.state = Some(state);
    }

    /// これまでに加算された重み付きスコアを返します。
    #[inline(always)]
    pub fn score(&self) -> f32 {
        self.score
    }
}

/// 重み付けされた素性の集合
pub struct Objective {
    features: Vec<Box<dyn Feature>>,
    offsets: Vec<usize>,
    weights: Vec<f32>,
    sparse_weights: HashMap<String, f32>,
    feature_init: FeatureInit,
}

impl Default for Objective {
    fn default() -> Self {
        Self::new()
    }
}

impl Objective {
    /// 素性を持たない目的関数を作成します。
    pub fn new() -> Self {
        Self {
            features: vec![],
            offsets: vec![],
            weights: vec![],
            sparse_weights: HashMap::new(),
            feature_init: FeatureInit::default(),
        }
    }

    /// 素性を登録し、密素性スロットを割り当てます。
    ///
    /// 追加されたスロットの重みは0で初期化されます。
    pub fn add_feature<F>(&mut self, mut feature: F)
    where
        F: Feature + 'static,
    {
        feature.init(&mut self.feature_init);
        let offset = self.weights.len();
        log::debug!(
            "feature {} uses dense slots {}..{}",
            feature.name(),
            offset,
            offset + feature.dense_feature_count()
        );
        self.weights.resize(offset + feature.dense_feature_count(), 0.0);
        self.offsets.push(offset);
        self.features.push(Box::new(feature));
    }

    /// 密な重みベクトルを返します。
    #[inline(always)]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// 密素性 `index` の重みを設定します。
    ///
    /// # エラー
    ///
    /// `index` が密素性の数以上の場合、エラーを返します。
    pub fn set_weight(&mut self, index: usize, weight: f32) -> Result<()> {
        let len = self.weights.len();
        let slot = self.weights.get_mut(index).ok_or_else(|| {
            KotobaError::invalid_argument(
                "index",
                format!("{index} is out of {len} dense features"),
            )
        })?;
        *slot = weight;
        Ok(())
    }

    /// 重みを読み込みます。
    ///
    /// 名前が密素性の説明と一致する重みは密な重みに、
    /// それ以外は疎な素性の重みとして設定されます。
    pub fn load_weights(&mut self, weights: &Weights) {
        let descriptions = self.feature_descriptions();
        for (name, value) in weights.iter() {
            match descriptions.iter().position(|d| d == name) {
                Some(index) => self.weights[index] = value,
                None => {
                    log::warn!("weight {name} matches no dense feature; treating it as sparse");
                    self.sparse_weights.insert(name.to_string(), value);
                }
            }
        }
    }

    /// 密素性の総数を返します。
    #[inline(always)]
    pub fn dense_feature_count(&self) -> usize {
        self.weights.len()
    }

    /// 密素性 `index` の説明を返します。
    pub fn feature_description(&self, index: usize) -> Option<String> {
        self.features
            .iter()
            .zip(&self.offsets)
            .find(|&(f, &offset)| (offset..offset + f.dense_feature_count()).contains(&index))
            .map(|(f, &offset)| f.feature_description(index - offset))
    }

    /// すべての密素性の説明をスロット順に返します。
    pub fn feature_descriptions(&self) -> Vec<String> {
        self.features
            .iter()
            .flat_map(|f| (0..f.dense_feature_count()).map(|i| f.feature_description(i)))
            .collect()
    }

    /// フレーズテーブルのスコア欄に必要な値の数を返します。
    pub fn table_score_count(&self) -> usize {
        self.features.iter().map(|f| f.table_score_count()).sum()
    }

    /// 文頭の言語モデル状態を返します。
    #[inline(always)]
    pub fn begin_sentence_state(&self) -> LmState {
        self.feature_init.begin_sentence_state
    }

    /// 空の素性記録を作成します。
    pub fn new_store(&self) -> FeatureStore {
        FeatureStore::new(self.dense_feature_count())
    }

    /// 2つの仮説がすべての素性にとって区別できない場合に `true` を返します。
    pub fn hypothesis_equal(&self, first: &Hypothesis, second: &Hypothesis) -> bool {
        self.features
            .iter()
            .all(|f| f.hypothesis_equal(first, second))
    }

    fn collector<'a>(&'a self, store: Option<&'a mut FeatureStore>) -> ScoreCollector<'a> {
        ScoreCollector::new(&self.weights, &self.sparse_weights, store)
    }

    /// (a) フレーズを単独でスコアリングします。
    pub fn score_phrase(
        &self,
        target: TargetPhraseInfo<'_>,
        store: Option<&mut FeatureStore>,
    ) -> f32 {
        let mut collector = self.collector(store);
        for (feature, &offset) in self.features.iter().zip(&self.offsets) {
            collector.set_dense_offset(offset);
            feature.score_target_phrase(target, &mut collector);
        }
        collector.score()
    }

    /// (b) 仮説に原言語フレーズを加えるときのスコアを返します。
    pub fn score_hypothesis_with_source_phrase(
        &self,
        hypothesis: &Hypothesis,
        source: SourcePhrase<'_>,
        store: Option<&mut FeatureStore>,
    ) -> f32 {
        let mut collector = self.collector(store);
        for (feature, &offset) in self.features.iter().zip(&self.offsets) {
            collector.set_dense_offset(offset);
            feature.score_hypothesis_with_source_phrase(hypothesis, source, &mut collector);
        }
        collector.score()
    }

    /// (c) 仮説にフレーズ対を加えるときのスコアと、新しい言語モデル状態を返します。
    ///
    /// 状態を設定する素性がない場合、`hypothesis` の状態がそのまま引き継がれます。
    pub fn score_hypothesis_with_phrase_pair(
        &self,
        hypothesis: &Hypothesis,
        pair: PhrasePair<'_>,
        store: Option<&mut FeatureStore>,
    ) -> (f32, LmState) {
        let mut collector = self.collector(store);
        for (feature, &offset) in self.features.iter().zip(&self.offsets) {
            collector.set_dense_offset(offset);
            feature.score_hypothesis_with_phrase_pair(hypothesis, pair, &mut collector);
        }
        let state = collector.state.unwrap_or(*hypothesis.state());
        (collector.score(), state)
    }

    /// (d) 完成した仮説を文末で再スコアリングします。
    pub fn rescore_hypothesis(
        &self,
        hypothesis: &Hypothesis,
        store: Option<&mut FeatureStore>,
    ) -> f32 {
        let mut collector = self.collector(store);
        for (feature, &offset) in self.features.iter().zip(&self.offsets) {
            collector.set_dense_offset(offset);
            feature.score_final_hypothesis(hypothesis, &mut collector);
        }
        collector.score()
    }
}
