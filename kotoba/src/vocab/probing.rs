//! オープンアドレス法による語彙
//!
//! 単語の64ビットハッシュ値からIDへのハッシュ表を保持します。
//! 検索と挿入はいずれも期待O(1)です。

use hashbrown::HashMap;

use crate::errors::{KotobaError, Result};
use crate::utils::FromU32;
use crate::vocab::{
    EnumerateVocab, LoadableVocabulary, UNK, UNK_WORD, Vocabulary, WordIndex, hash_for_vocab,
};

/// 想定語数に対するハッシュ表の拡大率
pub const DEFAULT_PROBING_MULTIPLIER: f32 = 1.5;

/// ハッシュ表による語彙
///
/// IDは挿入順に 1 から割り当てられます。
#[derive(Debug, Default, Clone)]
pub struct ProbingVocabulary {
    lookup: HashMap<u64, WordIndex>,
    words: Vec<Box<str>>,
    bound: WordIndex,
    saw_unk: bool,
    finished: bool,
}

impl ProbingVocabulary {
    /// 拡大率を指定して空の語彙を作成します。
    ///
    /// # 引数
    ///
    /// * `entries` - 想定される語数
    /// * `probing_multiplier` - ハッシュ表の拡大率（1.0以上）
    pub fn with_multiplier(entries: usize, probing_multiplier: f32) -> Self {
        let capacity = (entries as f32 * probing_multiplier.max(1.0)).ceil() as usize;
        Self {
            lookup: HashMap::with_capacity(capacity),
            words: Vec::with_capacity(entries),
            bound: 1,
            saw_unk: false,
            finished: false,
        }
    }

    /// 登録済みの語数（`<unk>` を除く）を返します。
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// 語が登録されていない場合に `true` を返します。
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// ハッシュ値 `hash` を持つ `word` を登録します。
    ///
    /// 同じハッシュ値に別の語がすでに登録されている場合はエラーになります。
    fn insert_hashed(&mut self, hash: u64, word: &str) -> Result<WordIndex> {
        if let Some(&id) = self.lookup.get(&hash) {
            // words[id - 1] because <unk> is not stored.
            let existing = &self.words[usize::from_u32(id) - 1];
            if &**existing != word {
                return Err(KotobaError::invalid_state(
                    "vocabulary hash collision",
                    format!("{existing:?} and {word:?}"),
                ));
            }
            return Ok(id);
        }
        let id = self.bound;
        self.bound = id
            .checked_add(1)
            .ok_or_else(|| KotobaError::invalid_state("vocabulary is full", word))?;
        self.lookup.insert(hash, id);
        self.words.push(word.into());
        Ok(id)
    }
}

impl Vocabulary for ProbingVocabulary {
    #[inline(always)]
    fn index(&self, word: &str) -> WordIndex {
        self.lookup
            .get(&hash_for_vocab(word))
            .copied()
            .unwrap_or(UNK)
    }

    fn bound(&self) -> WordIndex {
        self.bound
    }

    fn saw_unk(&self) -> bool {
        self.saw_unk
    }
}

impl LoadableVocabulary for ProbingVocabulary {
    fn with_capacity(entries: usize) -> Self {
        Self::with_multiplier(entries, DEFAULT_PROBING_MULTIPLIER)
    }

    fn insert(&mut self, word: &str) -> Result<WordIndex> {
        if self.finished {
            return Err(KotobaError::invalid_state(
                "ProbingVocabulary is already finished",
                format!("cannot insert {word:?}"),
            ));
        }
        if word == UNK_WORD {
            self.saw_unk = true;
            return Ok(UNK);
        }
        self.insert_hashed(hash_for_vocab(word), word)
    }

    fn finished_loading(&mut self, enumerate: Option<&mut dyn EnumerateVocab>) -> Result<()> {
        if let Some(enumerate) = enumerate {
            enumerate.add(UNK, UNK_WORD);
            for (i, word) in self.words.iter().enumerate() {
                enumerate.add(WordIndex::try_from(i + 1)?, word);
            }
        }
        self.words = Vec::new();
        self.finished = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
