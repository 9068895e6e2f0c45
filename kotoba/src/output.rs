//! 導出木の組み立てと出力
//!
//! 探索後のルート頂点から仮説の由来をたどり、導出木 [`Final`] を
//! アリーナ上に組み立てます。出力は規則の右辺を左から読み、
//! 終端記号はそのまま、非終端記号は次の子の導出で置き換えて得られます。

use bumpalo::Bump;

use crate::errors::{KotobaError, Result};
use crate::scorer::{
    FeatureStore, Objective, PhrasePair, SourcePhrase, TargetPhraseInfo, TargetPhraseType,
};
use crate::search::{Child, Graph, History, RuleItem};
use crate::utils::FromU32;
use crate::vocab::{UNK_WORD, WordIndex};

/// 導出木のノード
///
/// 規則の右辺に含まれる非終端記号の数は、子の数と常に一致します。
#[derive(Debug)]
pub struct Final<'a> {
    items: &'a [RuleItem],
    children: &'a [&'a Final<'a>],
}

impl<'a> Final<'a> {
    /// 規則の右辺を返します。
    #[inline(always)]
    pub fn items(&self) -> &'a [RuleItem] {
        self.items
    }

    /// 子の導出を返します。
    #[inline(always)]
    pub fn children(&self) -> &'a [&'a Final<'a>] {
        self.children
    }

    /// 導出が生成する単語ID列を `out` に追加します。
    pub fn push_words(&self, out: &mut Vec<WordIndex>) {
        let mut children = self.children.iter();
        for item in self.items {
            match *item {
                RuleItem::Terminal(word) => out.push(word),
                RuleItem::NonTerminal => {
                    if let Some(child) = children.next() {
                        child.push_words(out);
                    }
                }
            }
        }
    }

    /// 導出が生成する単語ID列を返します。
    pub fn words(&self) -> Vec<WordIndex> {
        let mut out = vec![];
        self.push_words(&mut out);
        out
    }
}

/// 頂点 `child` の `index` 番目の仮説の導出木を組み立てます。
///
/// # エラー
///
/// 仮説の由来がグラフと矛盾する場合、エラーを返します。
pub fn assemble<'a>(
    arena: &'a Bump,
    graph: &Graph<'_>,
    child: Child,
    index: usize,
) -> Result<&'a Final<'a>> {
    let hypothesis = graph.child(child).hypotheses().get(index).ok_or_else(|| {
        KotobaError::invalid_state("dangling hypothesis", format!("{child:?}[{index}]"))
    })?;
    let node = match *hypothesis.history() {
        History::Start => Final {
            items: &[],
            children: &[],
        },
        History::Phrase { phrase, .. } => {
            let words = graph.phrase_words(child, phrase);
            Final {
                items: arena.alloc_slice_fill_iter(words.iter().map(|&w| RuleItem::Terminal(w))),
                children: &[],
            }
        }
        History::Derivation { edge, children } => {
            let edge = graph.edge(edge);
            let mut built = Vec::with_capacity(edge.arity());
            for (k, &i) in children.iter().enumerate().take(edge.arity()) {
                let next = edge.child(k).ok_or_else(|| {
                    KotobaError::invalid_state("missing child", format!("{child:?}"))
                })?;
                built.push(assemble(arena, graph, next, usize::from_u32(i))?);
            }
            Final {
                items: arena.alloc_slice_copy(edge.rule()),
                children: arena.alloc_slice_copy(&built),
            }
        }
    };
    Ok(arena.alloc(node))
}

/// 導出木を空白区切りの文字列にします。
pub fn render(root: &Final<'_>, graph: &Graph<'_>) -> String {
    let vocab = graph.vocab();
    let mut text = String::new();
    for word in root.words() {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(vocab.word(word).unwrap_or(UNK_WORD));
    }
    text
}

/// 頂点 `child` の `index` 番目の仮説について、素性ごとの値を再計算して `store` に加えます。
///
/// 記録された密素性と重みの内積は、仮説のスコアに一致します。
pub fn feature_breakdown(
    objective: &Objective,
    graph: &Graph<'_>,
    child: Child,
    index: usize,
    store: &mut FeatureStore,
) -> Result<()> {
    let hypothesis = graph.child(child).hypotheses().get(index).ok_or_else(|| {
        KotobaError::invalid_state("dangling hypothesis", format!("{child:?}[{index}]"))
    })?;
    match *hypothesis.history() {
        History::Start => {}
        History::Phrase { phrase, scores } => {
            let (kind, scores) = match child {
                Child::Table(_) => (TargetPhraseType::Table, graph.table().scores(scores)),
                Child::Graph(_) => (TargetPhraseType::Passthrough, &[][..]),
            };
            let target = TargetPhraseInfo {
                words: graph.phrase_words(child, phrase),
                kind,
                scores,
            };
            objective.score_phrase(target, Some(store));
        }
        History::Derivation { edge: edge_id, children } => {
            let edge = graph.edge(edge_id);
            let missing =
                || KotobaError::invalid_state("missing child", format!("{edge_id:?}"));
            for (k, &i) in children.iter().enumerate().take(edge.arity()) {
                let next = edge.child(k).ok_or_else(missing)?;
                feature_breakdown(objective, graph, next, usize::from_u32(i), store)?;
            }

            let left_child = edge.child(0).ok_or_else(missing)?;
            let left = &graph.child(left_child).hypotheses()[usize::from_u32(children[0])];
            if edge.arity() == 1 {
                objective.rescore_hypothesis(left, Some(store));
                return Ok(());
            }
            let right_child = edge.child(1).ok_or_else(missing)?;
            let right = &graph.child(right_child).hypotheses()[usize::from_u32(children[1])];
            let History::Phrase { phrase, .. } = *right.history() else {
                return Err(missing());
            };
            let (begin, end) = edge.span();
            let source = SourcePhrase::new(graph.source(), begin, end);
            objective.score_hypothesis_with_source_phrase(left, source, Some(&mut *store));
            let pair = PhrasePair {
                source,
                target: graph.phrase_words(right_child, phrase),
            };
            objective.score_hypothesis_with_phrase_pair(left, pair, Some(store));
        }
    }
    Ok(())
}
