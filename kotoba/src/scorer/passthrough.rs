use crate::scorer::{Feature, ScoreCollector, TargetPhraseInfo, TargetPhraseType};

/// 素通しされたフレーズを数える素性
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl Feature for Passthrough {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn score_target_phrase(
        &self,
        target: TargetPhraseInfo<'_>,
        collector: &mut ScoreCollector<'_>,
    ) {
        let value = if target.kind == TargetPhraseType::Passthrough {
            1.0
        } else {
            0.0
        };
        collector.add_dense(0, value);
    }

    fn dense_feature_count(&self) -> usize {
        1
    }

    fn feature_description(&self, index: usize) -> String {
        debug_assert_eq!(index, 0);
        "passthrough".to_string()
    }
}
