//! 挿入可能な語彙
//!
//! フレーズテーブルの読み込みと探索で共有される、追記専用の語彙です。

use hashbrown::HashMap;

use crate::errors::{KotobaError, Result};
use crate::utils::FromU32;
use crate::vocab::{UNK, UNK_WORD, Vocabulary, WordIndex};

/// 追記専用の語彙
///
/// 一度割り当てられたIDは語彙の生存期間中変わりません。
/// ID 0 は `<unk>` に予約されています。
#[derive(Debug, Clone)]
pub struct MutableVocab {
    map: HashMap<Box<str>, WordIndex>,
    words: Vec<Box<str>>,
    limit: WordIndex,
    saw_unk: bool,
}

impl Default for MutableVocab {
    fn default() -> Self {
        Self::new()
    }
}

impl MutableVocab {
    /// `<unk>` のみを含む新しい語彙を作成します。
    pub fn new() -> Self {
        Self::with_limit(WordIndex::MAX)
    }

    /// IDの上限（排他的）を指定して語彙を作成します。
    pub(crate) fn with_limit(limit: WordIndex) -> Self {
        let mut map = HashMap::new();
        map.insert(UNK_WORD.into(), UNK);
        Self {
            map,
            words: vec![UNK_WORD.into()],
            limit,
            saw_unk: false,
        }
    }

    /// 文字列のIDを返します。未登録の場合は次のIDを割り当てて登録します。
    ///
    /// # 引数
    ///
    /// * `word` - 登録する文字列
    ///
    /// # 戻り値
    ///
    /// 既存または新規のID
    ///
    /// # エラー
    ///
    /// 新しいIDが32ビットで表せる上限に達した場合、
    /// [`KotobaError::CapacityExceeded`] を返します。
    pub fn find_or_insert(&mut self, word: &str) -> Result<WordIndex> {
        if let Some(&id) = self.map.get(word) {
            if id == UNK {
                self.saw_unk = true;
            }
            return Ok(id);
        }
        // The bound (id + 1) must stay representable too.
        let id = WordIndex::try_from(self.words.len())
            .ok()
            .filter(|&id| id < self.limit)
            .ok_or(KotobaError::CapacityExceeded {
                what: "vocabulary",
                capacity: usize::from_u32(self.limit),
            })?;
        self.map.insert(word.into(), id);
        self.words.push(word.into());
        Ok(id)
    }

    /// 文字列のIDを検索します（読み取り専用）。
    ///
    /// # 戻り値
    ///
    /// 登録済みの場合はそのID、未登録の場合は[`UNK`]
    #[inline(always)]
    pub fn index(&self, word: &str) -> WordIndex {
        self.map.get(word).copied().unwrap_or(UNK)
    }

    /// IDに対応する文字列を返します。
    #[inline(always)]
    pub fn word(&self, id: WordIndex) -> Option<&str> {
        self.words.get(usize::from_u32(id)).map(|w| &**w)
    }

    /// IDの排他的上限を返します。
    #[inline(always)]
    pub fn bound(&self) -> WordIndex {
        // find_or_insert keeps the length at or below the limit.
        WordIndex::try_from(self.words.len()).unwrap_or(WordIndex::MAX)
    }

    /// 割り当て可能なIDの上限（排他的）を返します。
    #[inline(always)]
    pub(crate) fn limit(&self) -> WordIndex {
        self.limit
    }

    /// 登録済みの語数（`<unk>` を含む）を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// `<unk>` 以外に語が登録されていない場合に `true` を返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.words.len() <= 1
    }
}

impl Vocabulary for MutableVocab {
    fn index(&self, word: &str) -> WordIndex {
        MutableVocab::index(self, word)
    }

    fn bound(&self) -> WordIndex {
        MutableVocab::bound(self)
    }

    fn saw_unk(&self) -> bool {
        self.saw_unk
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_find_or_insert() {
        let mut vocab = MutableVocab::new();
        let a = vocab.find_or_insert("a").unwrap();
        let b = vocab.find_or_insert("b").unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(vocab.find_or_insert("a").unwrap(), a);
        assert_eq!(vocab.bound(), 3);
        assert_eq!(vocab.word(b), Some("b"));
    }

    #[test]
    fn test_index_unknown() {
        let mut vocab = MutableVocab::new();
        vocab.find_or_insert("a").unwrap();
        assert_eq!(vocab.index("never"), UNK);
        assert_eq!(vocab.bound(), 2);
    }

    #[test]
    fn test_unk_is_reserved() {
        let mut vocab = MutableVocab::new();
        assert!(!Vocabulary::saw_unk(&vocab));
        assert_eq!(vocab.find_or_insert("<unk>").unwrap(), UNK);
        assert!(Vocabulary::saw_unk(&vocab));
        assert_eq!(vocab.word(UNK), Some("<unk>"));
    }

    #[test]
    fn test_find_or_insert_overflow() {
        let mut vocab = MutableVocab::with_limit(3);
        assert_eq!(vocab.find_or_insert("a").unwrap(), 1);
        assert_eq!(vocab.find_or_insert("b").unwrap(), 2);
        assert!(matches!(
            vocab.find_or_insert("c"),
            Err(KotobaError::CapacityExceeded {
                what: "vocabulary",
                capacity: 3
            })
        ));
        assert_eq!(vocab.index("c"), UNK);
        assert_eq!(vocab.find_or_insert("a").unwrap(), 1);
        assert_eq!(vocab.bound(), 3);
    }

    proptest! {
        #[test]
        fn prop_interning_is_idempotent(words in prop::collection::vec("[a-z]{1,6}", 1..40)) {
            let mut vocab = MutableVocab::new();
            for w in &words {
                let id = vocab.find_or_insert(w).unwrap();
                prop_assert_eq!(vocab.index(w), id);
                prop_assert_eq!(vocab.find_or_insert(w).unwrap(), id);
                prop_assert_eq!(vocab.word(id), Some(w.as_str()));
            }
            prop_assert_eq!(vocab.index("UNSEEN"), UNK);
        }
    }
}
