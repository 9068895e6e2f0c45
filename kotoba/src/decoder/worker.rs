//! 文ごとの翻訳処理
//!
//! ワーカーは探索の作業領域と導出木のアリーナを保持し、文をまたいで再利用します。
use std::sync::Arc;

use bumpalo::Bump;

use crate::decoder::Decoder;
use crate::errors::{KotobaError, Result};
use crate::output::{assemble, feature_breakdown, render};
use crate::scorer::FeatureStore;
use crate::search::{Child, Context, Graph, search};

/// 1つの翻訳候補
#[derive(Clone, Debug, PartialEq)]
pub struct Translation {
    text: String,
    score: f32,
    features: Option<FeatureStore>,
}

impl Translation {
    /// 翻訳文を返します。
    #[inline(always)]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 重み付きスコアを返します。
    #[inline(always)]
    pub fn score(&self) -> f32 {
        self.score
    }

    /// 素性の内訳を返します。内訳を記録しない設定では `None` です。
    #[inline(always)]
    pub fn features(&self) -> Option<&FeatureStore> {
        self.features.as_ref()
    }
}

/// 翻訳処理のためのルーチンを提供する構造体
///
/// # 例
///
/// ```ignore
/// let mut worker = decoder.new_worker();
/// worker.reset_sentence("das Haus");
/// worker.decode()?;
/// for translation in worker.translations() {
///     println!("{}", translation.text());
/// }
/// ```
pub struct Worker {
    decoder: Decoder,
    sentence: String,
    context: Context,
    arena: Bump,
    translations: Vec<Translation>,
}

impl Worker {
    pub(crate) fn new(decoder: Decoder) -> Self {
        let context = Context::new(decoder.pop_limit).with_tie_break(decoder.tie_break);
        Self {
            decoder,
            sentence: String::new(),
            context,
            arena: Bump::new(),
            translations: vec![],
        }
    }

    /// 翻訳する入力文を設定します。入力は空白で単語に区切られます。
    pub fn reset_sentence<S>(&mut self, input: S)
    where
        S: AsRef<str>,
    {
        self.sentence.clear();
        self.sentence.push_str(input.as_ref());
        self.translations.clear();
    }

    /// 設定された入力文を翻訳します。
    ///
    /// 空の文も翻訳でき、空文字列の候補が1つ得られます。
    ///
    /// # エラー
    ///
    /// 探索グラフの確保量が見積もりを超えた場合など、内部状態が矛盾したときにエラーを返します。
    pub fn decode(&mut self) -> Result<()> {
        self.translations.clear();
        self.arena.reset();

        let model = Arc::clone(&self.decoder.model);
        let objective = model.objective();
        let mut graph = Graph::new(model.table(), model.vocab());
        graph.set_source(self.sentence.split_whitespace())?;
        search(&mut self.context, objective, &mut graph)?;

        let root = graph
            .root()
            .ok_or_else(|| KotobaError::invalid_state("graph has no root", "search"))?;
        let root = Child::Graph(root);
        let count = graph.child(root).len().min(self.decoder.nbest);
        for i in 0..count {
            let tree = assemble(&self.arena, &graph, root, i)?;
            let features = if self.decoder.detail {
                let mut store = objective.new_store();
                feature_breakdown(objective, &graph, root, i, &mut store)?;
                Some(store)
            } else {
                None
            };
            self.translations.push(Translation {
                text: render(tree, &graph),
                score: graph.child(root).hypotheses()[i].score(),
                features,
            });
        }
        log::debug!(
            "decoded {} words: {} vertices, {} edges, {} translations",
            graph.source().len(),
            graph.num_vertices(),
            graph.num_edges(),
            self.translations.len()
        );
        Ok(())
    }

    /// 翻訳候補の数を返します。
    #[inline(always)]
    pub fn num_translations(&self) -> usize {
        self.translations.len()
    }

    /// `i` 番目の翻訳候補を返します。候補はスコアの高い順です。
    #[inline(always)]
    pub fn translation(&self, i: usize) -> Option<&Translation> {
        self.translations.get(i)
    }

    /// 最良の翻訳候補を返します。
    #[inline(always)]
    pub fn best(&self) -> Option<&Translation> {
        self.translations.first()
    }

    /// すべての翻訳候補を返します。
    #[inline(always)]
    pub fn translations(&self) -> &[Translation] {
        &self.translations
    }
}
