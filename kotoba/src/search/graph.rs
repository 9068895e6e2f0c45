use crate::alloc::{FixedAllocator, Phrase, PhrasePool};
use crate::errors::{KotobaError, Result};
use crate::phrase_table::{PhraseTable, make_passthrough};
use crate::scorer::Objective;
use crate::search::{
    Child, Edge, EdgeId, History, Hypothesis, RuleItem, TieBreak, Vertex, VertexId,
};
use crate::vocab::{MutableVocab, SentenceVocab, WordIndex};

/// 一文ぶんの探索グラフ
///
/// 頂点とエッジは [`set_counts`](Self::set_counts) で確定した容量の
/// 固定アロケータから確保されます。容量を超える確保はエラーになります。
pub struct Graph<'t> {
    table: &'t PhraseTable,
    vocab: SentenceVocab<'t>,
    source: Vec<WordIndex>,
    vertices: FixedAllocator<Vertex>,
    edges: FixedAllocator<Edge>,
    passthrough: PhrasePool,
    root: Option<VertexId>,
}

/// 単調デコーディング用に構築したグラフの配置
#[derive(Debug)]
pub struct Layout {
    /// 接頭辞頂点。`prefixes[k]` は原言語の `[0, k)` を翻訳し終えた状態です。
    pub prefixes: Vec<VertexId>,
    /// `incoming[k]` は接頭辞頂点 `k` に入るエッジです。
    pub incoming: Vec<Vec<EdgeId>>,
    /// ルート頂点に入るエッジ
    pub root_edge: EdgeId,
}

impl<'t> Graph<'t> {
    /// 空のグラフを作成します。
    ///
    /// # 引数
    ///
    /// * `table` - フレーズテーブル
    /// * `vocab` - フレーズテーブルと共有する語彙
    pub fn new(table: &'t PhraseTable, vocab: &'t MutableVocab) -> Self {
        Self {
            table,
            vocab: SentenceVocab::new(vocab),
            source: vec![],
            vertices: FixedAllocator::new("vertices"),
            edges: FixedAllocator::new("edges"),
            passthrough: PhrasePool::new(),
            root: None,
        }
    }

    /// 入力文を設定します。語彙にない単語にはこの文に限ったIDが割り当てられます。
    ///
    /// # エラー
    ///
    /// 未知語のIDが語彙の上限を超える場合、エラーを返します。
    pub fn set_source<'s, I>(&mut self, words: I) -> Result<()>
    where
        I: IntoIterator<Item = &'s str>,
    {
        self.source.clear();
        for word in words {
            let id = self.vocab.find_or_insert(word)?;
            self.source.push(id);
        }
        Ok(())
    }

    /// 入力文の単語ID列を返します。
    #[inline(always)]
    pub fn source(&self) -> &[WordIndex] {
        &self.source
    }

    /// 頂点とエッジの数を確定します。
    ///
    /// # エラー
    ///
    /// 二度呼ばれた場合、エラーを返します。
    pub fn set_counts(&mut self, vertices: usize, edges: usize) -> Result<()> {
        self.vertices.init(vertices)?;
        self.edges.init(edges)
    }

    /// 新しい頂点を確保します。
    pub fn new_vertex(&mut self) -> Result<VertexId> {
        self.vertices.alloc()
    }

    /// 新しいエッジを確保します。
    pub fn new_edge(&mut self) -> Result<EdgeId> {
        self.edges.alloc()
    }

    /// 頂点への参照を返します。
    #[inline(always)]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id]
    }

    /// 頂点への可変参照を返します。
    #[inline(always)]
    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id]
    }

    /// エッジへの参照を返します。
    #[inline(always)]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    /// エッジへの可変参照を返します。
    #[inline(always)]
    pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id]
    }

    /// 子頂点を解決します。
    #[inline(always)]
    pub fn child(&self, child: Child) -> &Vertex {
        match child {
            Child::Graph(id) => &self.vertices[id],
            Child::Table(id) => self.table.entry(id).vertex(),
        }
    }

    /// 子頂点の仮説が指すフレーズの単語列を返します。
    #[inline(always)]
    pub fn phrase_words(&self, child: Child, phrase: Phrase) -> &[WordIndex] {
        match child {
            Child::Graph(_) => self.passthrough.words(phrase),
            Child::Table(_) => self.table.pool().words(phrase),
        }
    }

    /// ルート頂点を設定します。
    pub fn set_root(&mut self, root: VertexId) {
        self.root = Some(root);
    }

    /// ルート頂点を返します。
    #[inline(always)]
    pub fn root(&self) -> Option<VertexId> {
        self.root
    }

    /// この文の語彙を返します。
    #[inline(always)]
    pub fn vocab(&self) -> &SentenceVocab<'t> {
        &self.vocab
    }

    /// この文の語彙への可変参照を返します。
    #[inline(always)]
    pub fn vocab_mut(&mut self) -> &mut SentenceVocab<'t> {
        &mut self.vocab
    }

    /// フレーズテーブルを返します。
    #[inline(always)]
    pub fn table(&self) -> &'t PhraseTable {
        self.table
    }

    /// 確保済みの頂点数を返します。
    #[inline(always)]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// 確保済みのエッジ数を返します。
    #[inline(always)]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// 単調デコーディングのグラフを構築します。
    ///
    /// 原言語の各区間をフレーズテーブルで引き、見つかったエントリごとにエッジを作ります。
    /// 1語のエントリがない位置には素通しの頂点を作ります。
    /// 頂点とエッジの数は構築前に正確に数えられます。
    pub fn build_monotone(&mut self, objective: &Objective) -> Result<Layout> {
        if self.vertices.size() != 0 {
            return Err(KotobaError::invalid_state(
                "graph is already built",
                "a graph holds exactly one sentence",
            ));
        }
        let n = self.source.len();
        let max_len = self.table.max_source_phrase_length();

        let mut spans: Vec<(usize, usize, Child)> = vec![];
        let mut passthrough_positions = vec![];
        for begin in 0..n {
            let mut has_single = false;
            for end in begin + 1..=n.min(begin + max_len) {
                if let Some(entry) = self.table.lookup(&self.source[begin..end]) {
                    spans.push((begin, end, Child::Table(entry)));
                    has_single |= end == begin + 1;
                }
            }
            if !has_single {
                passthrough_positions.push(begin);
            }
        }

        let num_vertices = (n + 1) + passthrough_positions.len() + 1;
        let num_edges = spans.len() + passthrough_positions.len() + 1;
        self.set_counts(num_vertices, num_edges)?;

        let prefixes = (0..=n)
            .map(|_| self.new_vertex())
            .collect::<Result<Vec<_>>>()?;
        let start = self.vertex_mut(prefixes[0]);
        start.init_root();
        start.append_hypothesis(Hypothesis::new(
            0.0,
            objective.begin_sentence_state(),
            History::Start,
        ));
        start.finish_root(TieBreak::Left, None);

        for &pos in &passthrough_positions {
            let word = self.source[pos];
            let id = self.new_vertex()?;
            *self.vertex_mut(id) = make_passthrough(&mut self.passthrough, objective, word);
            spans.push((pos, pos + 1, Child::Graph(id)));
            log::debug!(
                "passthrough at {pos}: {}",
                self.vocab.word(word).unwrap_or_default()
            );
        }

        let mut incoming = vec![vec![]; n + 1];
        for (begin, end, phrase) in spans {
            let id = self.new_edge()?;
            let edge = self.edge_mut(id);
            edge.init_rule()
                .extend([RuleItem::NonTerminal, RuleItem::NonTerminal]);
            edge.add(Child::Graph(prefixes[begin]));
            edge.add(phrase);
            edge.set_span(begin, end);
            incoming[end].push(id);
        }

        let root = self.new_vertex()?;
        let root_edge = self.new_edge()?;
        let edge = self.edge_mut(root_edge);
        edge.init_rule().push(RuleItem::NonTerminal);
        edge.add(Child::Graph(prefixes[n]));
        edge.set_span(0, n);
        self.set_root(root);

        Ok(Layout {
            prefixes,
            incoming,
            root_edge,
        })
    }
}
