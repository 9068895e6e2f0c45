//! ソート済みハッシュによる語彙
//!
//! 単語の64ビットハッシュ値をソートした配列のみを保持し、
//! 配列上の位置をIDとして使用します。文字列自体は保持しません。

use std::cmp::Ordering;

use crate::errors::{KotobaError, Result};
use crate::vocab::{
    EnumerateVocab, LoadableVocabulary, UNK, UNK_WORD, Vocabulary, WordIndex, hash_for_vocab,
};

/// 区間がこの長さ以下になったら二分探索に切り替える
const LINEAR_FALLBACK_LEN: usize = 8;

/// ソート済みハッシュ配列による読み取り最適化された語彙
///
/// `<unk>` (ID 0) は配列に含まれないため、ID は「配列上の位置 + 1」になります。
/// 読み込み完了時にIDはハッシュ順に振り直されます。
#[derive(Debug, Default, Clone)]
pub struct SortedVocabulary {
    hashes: Vec<u64>,
    pending: Vec<(u64, Box<str>)>,
    bound: WordIndex,
    saw_unk: bool,
    finished: bool,
}

impl SortedVocabulary {
    /// 空の語彙を作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録済みの語数（`<unk>` を除く）を返します。
    pub fn len(&self) -> usize {
        if self.finished {
            self.hashes.len()
        } else {
            self.pending.len()
        }
    }

    /// 語が登録されていない場合に `true` を返します。
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// ソート済みの一様分布に近いキー列から補間探索で `key` を探します。
///
/// 見つかった場合はその位置を返します。
fn sorted_uniform_find(keys: &[u64], key: u64) -> Option<usize> {
    let mut lo = 0;
    let mut hi = keys.len();
    while lo < hi {
        let lo_key = keys[lo];
        let hi_key = keys[hi - 1];
        if key < lo_key || key > hi_key {
            return None;
        }
        if hi - lo <= LINEAR_FALLBACK_LEN || lo_key == hi_key {
            return keys[lo..hi].binary_search(&key).ok().map(|i| lo + i);
        }
        let span = u128::from(hi_key - lo_key);
        let offset = u128::from(key - lo_key) * (hi - 1 - lo) as u128 / span;
        let pivot = lo + offset as usize;
        match keys[pivot].cmp(&key) {
            Ordering::Equal => return Some(pivot),
            Ordering::Less => lo = pivot + 1,
            Ordering::Greater => hi = pivot,
        }
    }
    None
}

impl Vocabulary for SortedVocabulary {
    fn index(&self, word: &str) -> WordIndex {
        debug_assert!(self.finished, "SortedVocabulary queried before finished_loading");
        match sorted_uniform_find(&self.hashes, hash_for_vocab(word)) {
            // +1 because <unk> is 0 and does not appear in the lookup table.
            Some(pos) => WordIndex::try_from(pos + 1).unwrap_or(UNK),
            None => UNK,
        }
    }

    fn bound(&self) -> WordIndex {
        debug_assert!(self.finished, "SortedVocabulary::bound is valid only after loading");
        self.bound
    }

    fn saw_unk(&self) -> bool {
        self.saw_unk
    }
}

impl LoadableVocabulary for SortedVocabulary {
    fn with_capacity(entries: usize) -> Self {
        Self {
            pending: Vec::with_capacity(entries),
            ..Self::default()
        }
    }

    fn insert(&mut self, word: &str) -> Result<WordIndex> {
        if self.finished {
            return Err(KotobaError::invalid_state(
                "SortedVocabulary is already finished",
                format!("cannot insert {word:?}"),
            ));
        }
        if word == UNK_WORD {
            self.saw_unk = true;
            return Ok(UNK);
        }
        self.pending.push((hash_for_vocab(word), word.into()));
        Ok(WordIndex::try_from(self.pending.len())?)
    }

    fn finished_loading(&mut self, enumerate: Option<&mut dyn EnumerateVocab>) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_unstable_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        pending.dedup();
        if let Some(pair) = pending.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(KotobaError::invalid_state(
                "vocabulary hash collision",
                format!("{:?} and {:?}", pair[0].1, pair[1].1),
            ));
        }

        if let Some(enumerate) = enumerate {
            enumerate.add(UNK, UNK_WORD);
            for (i, (_, word)) in pending.iter().enumerate() {
                enumerate.add(WordIndex::try_from(i + 1)?, word);
            }
        }

        self.hashes = pending.into_iter().map(|(hash, _)| hash).collect();
        self.bound = WordIndex::try_from(self.hashes.len() + 1)?;
        self.finished = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_after_loading() {
        let mut vocab = SortedVocabulary::with_capacity(4);
        for w in ["the", "house", "is", "small"] {
            vocab.insert(w).unwrap();
        }
        vocab.finished_loading(None).unwrap();
        assert_eq!(vocab.bound(), 5);

        let mut ids: Vec<_> = ["the", "house", "is", "small"]
            .iter()
            .map(|w| vocab.index(w))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(vocab.index("garden"), UNK);
    }

    #[test]
    fn test_ids_follow_hash_order() {
        let words = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l"];
        let mut vocab = SortedVocabulary::new();
        for w in words {
            vocab.insert(w).unwrap();
        }
        let mut enumerated = vec![];
        vocab.finished_loading(Some(&mut enumerated)).unwrap();

        assert_eq!(enumerated[0], (UNK, "<unk>".to_string()));
        assert_eq!(enumerated.len(), words.len() + 1);
        for (id, word) in &enumerated[1..] {
            assert_eq!(vocab.index(word), *id);
        }
        for pair in enumerated[1..].windows(2) {
            assert!(hash_for_vocab(&pair[0].1) < hash_for_vocab(&pair[1].1));
        }
    }

    #[test]
    fn test_duplicates_are_merged() {
        let mut vocab = SortedVocabulary::new();
        vocab.insert("a").unwrap();
        vocab.insert("a").unwrap();
        vocab.finished_loading(None).unwrap();
        assert_eq!(vocab.len(), 1);
        assert_eq!(vocab.index("a"), 1);
    }

    #[test]
    fn test_unk_is_not_stored() {
        let mut vocab = SortedVocabulary::new();
        assert_eq!(vocab.insert("<unk>").unwrap(), UNK);
        vocab.finished_loading(None).unwrap();
        assert!(vocab.saw_unk());
        assert_eq!(vocab.bound(), 1);
    }

    #[test]
    fn test_insert_after_finished() {
        let mut vocab = SortedVocabulary::new();
        vocab.finished_loading(None).unwrap();
        assert!(vocab.insert("late").is_err());
    }

    #[test]
    fn test_sorted_uniform_find() {
        let keys: Vec<u64> = (0..1000).map(|i| i * 7919 + 13).collect();
        for (i, &k) in keys.iter().enumerate() {
            assert_eq!(sorted_uniform_find(&keys, k), Some(i));
        }
        assert_eq!(sorted_uniform_find(&keys, 14), None);
        assert_eq!(sorted_uniform_find(&keys, u64::MAX), None);
        assert_eq!(sorted_uniform_find(&[], 1), None);
    }
}
