//! 一文ぶんの語彙オーバーレイ
//!
//! 共有された [`MutableVocab`] を変更せずに、翻訳中の文にのみ現れる
//! 未知語へIDを割り当てます。ベース語彙の上限以降のIDが使われます。

use hashbrown::HashMap;

use crate::errors::{KotobaError, Result};
use crate::utils::FromU32;
use crate::vocab::{MutableVocab, UNK, UNK_WORD, Vocabulary, WordIndex};

/// 共有語彙の上に重ねる一文ぶんの語彙
#[derive(Debug)]
pub struct SentenceVocab<'v> {
    base: &'v MutableVocab,
    base_bound: WordIndex,
    ext_map: HashMap<Box<str>, WordIndex>,
    ext_words: Vec<Box<str>>,
}

impl<'v> SentenceVocab<'v> {
    /// 新しいオーバーレイを作成します。
    pub fn new(base: &'v MutableVocab) -> Self {
        Self {
            base,
            base_bound: base.bound(),
            ext_map: HashMap::new(),
            ext_words: vec![],
        }
    }

    /// ベース語彙への参照を返します。
    #[inline(always)]
    pub fn base(&self) -> &'v MutableVocab {
        self.base
    }

    /// 文字列のIDを返します。ベース語彙にない場合はこの文に限ったIDを割り当てます。
    ///
    /// # エラー
    ///
    /// 新しいIDがベース語彙の上限に達した場合、[`KotobaError::CapacityExceeded`] を返します。
    pub fn find_or_insert(&mut self, word: &str) -> Result<WordIndex> {
        let id = self.base.index(word);
        if id != UNK || word == UNK_WORD {
            return Ok(id);
        }
        if let Some(&id) = self.ext_map.get(word) {
            return Ok(id);
        }
        let limit = self.base.limit();
        let id = WordIndex::try_from(self.ext_words.len())
            .ok()
            .and_then(|offset| self.base_bound.checked_add(offset))
            .filter(|&id| id < limit)
            .ok_or(KotobaError::CapacityExceeded {
                what: "sentence vocabulary",
                capacity: usize::from_u32(limit),
            })?;
        self.ext_map.insert(word.into(), id);
        self.ext_words.push(word.into());
        Ok(id)
    }

    /// 文字列のIDを検索します（読み取り専用）。
    pub fn index(&self, word: &str) -> WordIndex {
        match self.base.index(word) {
            UNK => self.ext_map.get(word).copied().unwrap_or(UNK),
            id => id,
        }
    }

    /// IDに対応する文字列を返します。
    pub fn word(&self, id: WordIndex) -> Option<&str> {
        if id < self.base_bound {
            self.base.word(id)
        } else {
            self.ext_words
                .get(usize::from_u32(id - self.base_bound))
                .map(|w| &**w)
        }
    }

    /// この文で追加された語の数を返します。
    #[inline(always)]
    pub fn num_extensions(&self) -> usize {
        self.ext_words.len()
    }

    /// 指定したIDがこの文で追加された語かどうかを返します。
    #[inline(always)]
    pub fn is_extension(&self, id: WordIndex) -> bool {
        id >= self.base_bound
    }
}

impl Vocabulary for SentenceVocab<'_> {
    fn index(&self, word: &str) -> WordIndex {
        SentenceVocab::index(self, word)
    }

    fn bound(&self) -> WordIndex {
        let ext = WordIndex::try_from(self.ext_words.len()).unwrap_or(WordIndex::MAX);
        self.base_bound.saturating_add(ext)
    }

    fn saw_unk(&self) -> bool {
        self.base.saw_unk()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_does_not_touch_base() {
        let mut base = MutableVocab::new();
        let haus = base.find_or_insert("Haus").unwrap();
        let mut overlay = SentenceVocab::new(&base);

        assert_eq!(overlay.find_or_insert("Haus").unwrap(), haus);
        let oov = overlay.find_or_insert("Gartenzwerg").unwrap();
        assert_eq!(oov, base.bound());
        assert_eq!(overlay.find_or_insert("Gartenzwerg").unwrap(), oov);
        assert!(overlay.is_extension(oov));
        assert_eq!(overlay.word(oov), Some("Gartenzwerg"));
        assert_eq!(overlay.word(haus), Some("Haus"));
        assert_eq!(Vocabulary::bound(&overlay), base.bound() + 1);
        assert_eq!(base.index("Gartenzwerg"), UNK);
    }

    #[test]
    fn test_extension_respects_base_limit() {
        let mut base = MutableVocab::with_limit(4);
        base.find_or_insert("a").unwrap();
        base.find_or_insert("b").unwrap();
        let mut overlay = SentenceVocab::new(&base);
        assert_eq!(overlay.find_or_insert("c").unwrap(), 3);
        assert!(matches!(
            overlay.find_or_insert("d"),
            Err(KotobaError::CapacityExceeded { .. })
        ));
        assert_eq!(overlay.num_extensions(), 1);
        assert_eq!(overlay.find_or_insert("c").unwrap(), 3);
    }

    #[test]
    fn test_unk_stays_reserved() {
        let base = MutableVocab::new();
        let mut overlay = SentenceVocab::new(&base);
        assert_eq!(overlay.find_or_insert("<unk>").unwrap(), UNK);
        assert_eq!(overlay.num_extensions(), 0);
    }
}
