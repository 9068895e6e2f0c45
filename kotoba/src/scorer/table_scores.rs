use crate::scorer::{Feature, FeatureInit, ScoreCollector, TargetPhraseInfo, TargetPhraseType};

/// フレーズテーブルのスコア欄をそのまま密素性にする素性
///
/// 複数登録した場合、各インスタンスは登録順に続きの欄を読みます。
#[derive(Clone, Copy, Debug)]
pub struct TableScores {
    first: usize,
    count: usize,
}

impl TableScores {
    /// スコア欄の値の数を指定して作成します。
    pub const fn new(count: usize) -> Self {
        Self { first: 0, count }
    }
}

impl Feature for TableScores {
    fn name(&self) -> &str {
        "phrase_table"
    }

    fn init(&mut self, init: &mut FeatureInit) {
        self.first = init.table_score_offset;
        init.table_score_offset += self.count;
    }

    fn score_target_phrase(
        &self,
        target: TargetPhraseInfo<'_>,
        collector: &mut ScoreCollector<'_>,
    ) {
        if target.kind != TargetPhraseType::Table {
            return;
        }
        let columns = target.scores.iter().skip(self.first).take(self.count);
        for (i, &value) in columns.enumerate() {
            collector.add_dense(i, value);
        }
    }

    fn dense_feature_count(&self) -> usize {
        self.count
    }

    fn feature_description(&self, index: usize) -> String {
        format!("phrase_table_{}", self.first + index)
    }

    fn table_score_count(&self) -> usize {
        self.count
    }
}
