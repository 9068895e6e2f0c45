//! フレーズテーブル
//!
//! `原言語 ||| 目的言語 ||| スコア` 形式の行から、原言語フレーズごとの
//! 訳候補を保持するエントリを構築します。
//! 各エントリの訳候補はスコア付きの仮説として頂点に格納され、確定（整列・枝刈り）されます。
//!
//! 同じ原言語フレーズの行は連続している必要があります。
//! 離れた位置に再び現れた場合は [`KotobaError::NonConsecutiveSource`] になります。
//!
//! [`KotobaError::NonConsecutiveSource`]: crate::errors::KotobaError::NonConsecutiveSource

mod builder;

use std::io::Read;
use std::path::Path;

use hashbrown::HashMap;

use crate::alloc::{Id, PhrasePool};
use crate::errors::Result;
use crate::lm::LmState;
use crate::scorer::{Objective, TargetPhraseInfo, TargetPhraseType};
use crate::search::{History, Hypothesis, TieBreak, Vertex};
use crate::utils::{FromU32, hash_words};
use crate::vocab::{MutableVocab, WordIndex};

pub use crate::phrase_table::builder::PhraseTableBuilder;

/// エントリのID
pub type EntryId = Id<Entry>;

/// フレーズテーブル上のスコア欄の位置
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScoreSpan {
    offset: u32,
    len: u32,
}

impl ScoreSpan {
    /// スコア欄を持たないことを表します。
    pub const EMPTY: Self = Self { offset: 0, len: 0 };
}

/// 1つの原言語フレーズとその訳候補
#[derive(Debug)]
pub struct Entry {
    source: Box<[WordIndex]>,
    vertex: Vertex,
}

impl Entry {
    /// 原言語フレーズの単語ID列を返します。
    #[inline(always)]
    pub fn source(&self) -> &[WordIndex] {
        &self.source
    }

    /// 訳候補の仮説を保持する頂点を返します。
    #[inline(always)]
    pub fn vertex(&self) -> &Vertex {
        &self.vertex
    }
}

/// 原言語フレーズから訳候補を引く表
#[derive(Debug, Default)]
pub struct PhraseTable {
    // Keyed by the hash of the source word ids.
    index: HashMap<u64, u32>,
    entries: Vec<Entry>,
    pool: PhrasePool,
    scores: Vec<f32>,
    max_source_phrase_length: usize,
}

impl PhraseTable {
    /// 既定の設定でリーダーからフレーズテーブルを読み込みます。
    ///
    /// 詳細な設定が必要な場合は [`PhraseTableBuilder`] を使用してください。
    ///
    /// # 引数
    ///
    /// * `rdr` - フレーズテーブルのリーダー
    /// * `vocab` - 原言語と目的言語の単語を登録する語彙
    /// * `objective` - 訳候補をスコアリングする目的関数
    ///
    /// # エラー
    ///
    /// 形式が不正な場合や、原言語フレーズが連続していない場合、エラーを返します。
    pub fn from_reader<R>(rdr: R, vocab: &mut MutableVocab, objective: &Objective) -> Result<Self>
    where
        R: Read,
    {
        PhraseTableBuilder::new().from_reader(rdr, vocab, objective)
    }

    /// 既定の設定でファイルからフレーズテーブルを読み込みます。
    pub fn from_path<P>(path: P, vocab: &mut MutableVocab, objective: &Objective) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        PhraseTableBuilder::new().from_path(path, vocab, objective)
    }

    /// 原言語フレーズに対応するエントリのIDを返します。
    ///
    /// 見つからない場合は `None` を返します。
    pub fn lookup(&self, source: &[WordIndex]) -> Option<EntryId> {
        let &id = self.index.get(&hash_words(source))?;
        let entry = &self.entries[usize::from_u32(id)];
        (*entry.source == *source).then_some(Id::new(id))
    }

    /// 原言語フレーズに対応するエントリを返します。
    ///
    /// 見つからない場合は `None` を返します。
    pub fn phrases(&self, source: &[WordIndex]) -> Option<&Entry> {
        self.lookup(source).map(|id| self.entry(id))
    }

    /// IDに対応するエントリを返します。
    #[inline(always)]
    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.index()]
    }

    /// 最長の原言語フレーズの語数を返します。
    #[inline(always)]
    pub fn max_source_phrase_length(&self) -> usize {
        self.max_source_phrase_length
    }

    /// 目的言語フレーズを格納したプールを返します。
    #[inline(always)]
    pub fn pool(&self) -> &PhrasePool {
        &self.pool
    }

    /// スコア欄の値を返します。
    #[inline(always)]
    pub fn scores(&self, span: ScoreSpan) -> &[f32] {
        let begin = usize::from_u32(span.offset);
        &self.scores[begin..begin + usize::from_u32(span.len)]
    }

    /// エントリの数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// エントリがない場合に `true` を返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 翻訳できない単語をそのまま写す、仮説が1つだけの頂点を作成します。
///
/// # 引数
///
/// * `pool` - 目的言語フレーズを格納するプール
/// * `objective` - 素通しフレーズをスコアリングする目的関数
/// * `word` - 原言語の単語
pub fn make_passthrough(pool: &mut PhrasePool, objective: &Objective, word: WordIndex) -> Vertex {
    let phrase = pool.single(word);
    let score = objective.score_phrase(
        TargetPhraseInfo {
            words: pool.words(phrase),
            kind: TargetPhraseType::Passthrough,
            scores: &[],
        },
        None,
    );
    let mut vertex = Vertex::new();
    vertex.init_root();
    vertex.append_hypothesis(Hypothesis::new(
        score,
        LmState::empty(),
        History::Phrase {
            phrase,
            scores: ScoreSpan::EMPTY,
        },
    ));
    vertex.finish_root(TieBreak::Left, None);
    vertex
}
