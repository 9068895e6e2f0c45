use crate::phrase_table::EntryId;
use crate::search::{MAX_ARITY, VertexId};
use crate::vocab::WordIndex;

/// 規則の右辺の要素
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleItem {
    /// そのまま出力される単語
    Terminal(WordIndex),
    /// 次の子の導出に置き換えられる非終端記号
    NonTerminal,
}

/// エッジの子頂点
///
/// 頂点はグラフかフレーズテーブルのどちらかが所有します。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Child {
    /// グラフが所有する頂点
    Graph(VertexId),
    /// フレーズテーブルのエントリが所有する頂点
    Table(EntryId),
}

/// ハイパーエッジ（規則の適用）
#[derive(Clone, Debug, Default)]
pub struct Edge {
    rule: Vec<RuleItem>,
    children: [Option<Child>; MAX_ARITY],
    arity: usize,
    span: (usize, usize),
}

impl Edge {
    /// 規則を空にし、書き込み先を返します。
    pub fn init_rule(&mut self) -> &mut Vec<RuleItem> {
        self.rule.clear();
        &mut self.rule
    }

    /// 規則を返します。
    #[inline(always)]
    pub fn rule(&self) -> &[RuleItem] {
        &self.rule
    }

    /// 子頂点を追加します。
    ///
    /// # パニック
    ///
    /// 子の数が [`MAX_ARITY`] を超える場合、パニックします。
    pub fn add(&mut self, child: Child) {
        assert!(self.arity < MAX_ARITY, "edge arity exceeds {MAX_ARITY}");
        self.children[self.arity] = Some(child);
        self.arity += 1;
    }

    /// `i` 番目の子頂点を返します。
    #[inline(always)]
    pub fn child(&self, i: usize) -> Option<Child> {
        self.children.get(i).copied().flatten()
    }

    /// 子の数を返します。
    #[inline(always)]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// このエッジが翻訳する原言語の区間 `[begin, end)` を設定します。
    pub fn set_span(&mut self, begin: usize, end: usize) {
        self.span = (begin, end);
    }

    /// このエッジが翻訳する原言語の区間を返します。
    #[inline(always)]
    pub fn span(&self) -> (usize, usize) {
        self.span
    }
}
