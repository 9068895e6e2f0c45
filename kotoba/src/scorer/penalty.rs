use crate::scorer::{Feature, ScoreCollector, SourcePhrase, TargetPhraseInfo};
use crate::search::Hypothesis;

/// 出力語数に比例するペナルティ（1語につき -1）
#[derive(Clone, Copy, Debug, Default)]
pub struct WordPenalty;

impl Feature for WordPenalty {
    fn name(&self) -> &str {
        "word_penalty"
    }

    fn score_target_phrase(
        &self,
        target: TargetPhraseInfo<'_>,
        collector: &mut ScoreCollector<'_>,
    ) {
        collector.add_dense(0, -(target.words.len() as f32));
    }

    fn dense_feature_count(&self) -> usize {
        1
    }

    fn feature_description(&self, _index: usize) -> String {
        "word_penalty".to_string()
    }
}

/// 適用したフレーズの数を数える素性
#[derive(Clone, Copy, Debug, Default)]
pub struct PhrasePenalty;

impl Feature for PhrasePenalty {
    fn name(&self) -> &str {
        "phrase_penalty"
    }

    fn score_target_phrase(
        &self,
        _target: TargetPhraseInfo<'_>,
        _collector: &mut ScoreCollector<'_>,
    ) {
    }

    fn score_hypothesis_with_source_phrase(
        &self,
        _hypothesis: &Hypothesis,
        _source: SourcePhrase<'_>,
        collector: &mut ScoreCollector<'_>,
    ) {
        collector.add_dense(0, 1.0);
    }

    fn dense_feature_count(&self) -> usize {
        1
    }

    fn feature_description(&self, _index: usize) -> String {
        "phrase_penalty".to_string()
    }
}
