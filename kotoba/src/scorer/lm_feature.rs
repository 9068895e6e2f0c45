use crate::lm::LanguageModel;
use crate::scorer::{Feature, FeatureInit, PhrasePair, ScoreCollector, TargetPhraseInfo};
use crate::search::Hypothesis;

/// 言語モデル素性
///
/// フレーズ単独のスコアは文脈なしで計算し、仮説と結合するときに
/// 実際の文脈でのスコアとの差分を加えます。文末では `</s>` を加えます。
pub struct LanguageModelFeature<M> {
    model: M,
}

impl<M> LanguageModelFeature<M>
where
    M: LanguageModel,
{
    /// 言語モデルから素性を作成します。
    pub const fn new(model: M) -> Self {
        Self { model }
    }

    /// 言語モデルへの参照を返します。
    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M> Feature for LanguageModelFeature<M>
where
    M: LanguageModel,
{
    fn name(&self) -> &str {
        "lm"
    }

    fn init(&mut self, init: &mut FeatureInit) {
        init.begin_sentence_state = self.model.begin_sentence_state();
    }

    fn score_target_phrase(
        &self,
        target: TargetPhraseInfo<'_>,
        collector: &mut ScoreCollector<'_>,
    ) {
        let (score, _) = self
            .model
            .score_words(&self.model.null_context_state(), target.words);
        collector.add_dense(0, score);
    }

    fn score_hypothesis_with_phrase_pair(
        &self,
        hypothesis: &Hypothesis,
        pair: PhrasePair<'_>,
        collector: &mut ScoreCollector<'_>,
    ) {
        let (isolated, _) = self
            .model
            .score_words(&self.model.null_context_state(), pair.target);
        let (in_context, state) = self.model.score_words(hypothesis.state(), pair.target);
        collector.add_dense(0, in_context - isolated);
        collector.set_state(state);
    }

    fn score_final_hypothesis(
        &self,
        hypothesis: &Hypothesis,
        collector: &mut ScoreCollector<'_>,
    ) {
        collector.add_dense(0, self.model.score_end_sentence(hypothesis.state()));
    }

    fn hypothesis_equal(&self, first: &Hypothesis, second: &Hypothesis) -> bool {
        first.state() == second.state()
    }

    fn dense_feature_count(&self) -> usize {
        1
    }

    fn feature_description(&self, _index: usize) -> String {
        "lm".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::lm::{BackoffModel, LmState};
    use crate::scorer::{Objective, SourcePhrase, TargetPhraseType};
    use crate::search::History;
    use crate::vocab::{MutableVocab, SortedVocabulary, WordIndex};

    const ARPA: &str = include_str!("../tests/resources/bigram.arpa");

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn load() -> (BackoffModel<SortedVocabulary>, MutableVocab) {
        let mut vocab = MutableVocab::new();
        let model = BackoffModel::from_reader(ARPA.as_bytes(), &mut vocab).unwrap();
        (model, vocab)
    }

    fn objective() -> (Objective, MutableVocab) {
        let (model, vocab) = load();
        let mut objective = Objective::new();
        objective.add_feature(LanguageModelFeature::new(model));
        objective.set_weight(0, 1.0).unwrap();
        (objective, vocab)
    }

    /// 文脈 (a) と (c) を合わせて `words` を `state` の後ろに加えます。
    fn extend(objective: &Objective, state: LmState, words: &[WordIndex]) -> (f32, LmState) {
        let target = TargetPhraseInfo {
            words,
            kind: TargetPhraseType::Table,
            scores: &[],
        };
        let isolated = objective.score_phrase(target, None);
        let hypothesis = Hypothesis::new(0.0, state, History::Start);
        let source = [1, 2];
        let pair = PhrasePair {
            source: SourcePhrase::new(&source, 0, 2),
            target: words,
        };
        let (delta, state) = objective.score_hypothesis_with_phrase_pair(&hypothesis, pair, None);
        (isolated + delta, state)
    }

    #[test]
    fn test_phrase_score_has_no_context() {
        let (objective, vocab) = objective();
        let (model, _) = load();
        let words = ["x", "y"].map(|w| vocab.index(w));
        let target = TargetPhraseInfo {
            words: &words,
            kind: TargetPhraseType::Table,
            scores: &[],
        };
        let mut store = objective.new_store();
        let score = objective.score_phrase(target, Some(&mut store));
        let (expected, _) = model.score_words(&model.null_context_state(), &words);
        assert!(approx(score, expected));
        assert!(approx(store.dense()[0], expected));
    }

    #[test]
    fn test_split_phrase_equals_full_phrase() {
        let (objective, vocab) = objective();
        let (model, _) = load();
        let words = ["x", "y", "z", "x"].map(|w| vocab.index(w));
        let bos = objective.begin_sentence_state();
        assert_eq!(bos, model.begin_sentence_state());

        let (full, full_state) = extend(&objective, bos, &words);
        let (left, mid) = extend(&objective, bos, &words[..2]);
        let (right, split_state) = extend(&objective, mid, &words[2..]);

        assert!(approx(full, left + right));
        assert_eq!(full_state, split_state);
        let (in_context, model_state) = model.score_words(&bos, &words);
        assert!(approx(full, in_context));
        assert_eq!(full_state, model_state);
    }

    #[test]
    fn test_end_of_sentence() {
        let (objective, vocab) = objective();
        let (model, _) = load();
        let words = ["x", "y"].map(|w| vocab.index(w));
        let (_, state) = extend(&objective, objective.begin_sentence_state(), &words);

        let complete = Hypothesis::new(0.0, state, History::Start);
        let mut store = objective.new_store();
        let score = objective.rescore_hypothesis(&complete, Some(&mut store));
        assert!(approx(score, model.score_end_sentence(&state)));
        assert!(approx(score, -0.4));
        assert!(approx(store.dense()[0], -0.4));
    }

    #[test]
    fn test_equality_follows_state() {
        let (objective, vocab) = objective();
        let bos = objective.begin_sentence_state();
        let (_, after_y) = extend(&objective, bos, &[vocab.index("x"), vocab.index("y")]);
        let (_, after_z) = extend(&objective, bos, &[vocab.index("x"), vocab.index("z")]);
        let (_, again_y) = extend(&objective, bos, &[vocab.index("y")]);

        let first = Hypothesis::new(-1.0, after_y, History::Start);
        let second = Hypothesis::new(-2.0, after_z, History::Start);
        let third = Hypothesis::new(-3.0, again_y, History::Start);
        assert!(!objective.hypothesis_equal(&first, &second));
        assert!(objective.hypothesis_equal(&first, &third));
    }
}
