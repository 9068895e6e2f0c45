//! フレーズプール
//!
//! 単語IDの列を「長さ、ID、ID、...」の形で1本の配列に連続して格納します。
//! 各フレーズは1回の確保で完結し、長さを別の場所に持ちません。

use crate::vocab::WordIndex;
use crate::utils::FromU32;

/// プール内のフレーズを指すハンドル
///
/// ハンドルはプールが破棄されるまで有効です。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Phrase(usize);

impl Phrase {
    /// プール内のオフセットを返します。
    #[inline(always)]
    pub const fn offset(self) -> usize {
        self.0
    }
}

/// 可変長フレーズのためのアリーナ
#[derive(Debug, Default, Clone)]
pub struct PhrasePool {
    // Phrases are stored by interleaving their length and words.
    data: Vec<WordIndex>,
}

impl PhrasePool {
    /// 空のプールを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 語数の見積もりを指定して空のプールを作成します。
    pub fn with_capacity(words: usize) -> Self {
        Self {
            data: Vec::with_capacity(words),
        }
    }

    /// 長さ0の新しいフレーズを確保します。
    ///
    /// 最終的な長さが分からない場合は、続けて [`continue_with`](Self::continue_with)
    /// で単語を1つずつ追加します。
    #[inline(always)]
    pub fn allocate(&mut self) -> Phrase {
        let offset = self.data.len();
        self.data.push(0);
        Phrase(offset)
    }

    /// 直前に確保したフレーズの末尾に単語を追加します。
    ///
    /// # パニック
    ///
    /// `phrase` が直前に確保したフレーズでない場合、パニックします。
    #[inline(always)]
    pub fn continue_with(&mut self, phrase: Phrase, word: WordIndex) {
        let len = usize::from_u32(self.data[phrase.0]);
        assert_eq!(
            phrase.0 + 1 + len,
            self.data.len(),
            "only the most recent phrase can be extended"
        );
        self.data.push(word);
        self.data[phrase.0] += 1;
    }

    /// 単語列からフレーズを構築します。
    pub fn push_words<I>(&mut self, words: I) -> Phrase
    where
        I: IntoIterator<Item = WordIndex>,
    {
        let phrase = self.allocate();
        for word in words {
            self.continue_with(phrase, word);
        }
        phrase
    }

    /// 1語だけのフレーズを構築します。
    #[inline(always)]
    pub fn single(&mut self, word: WordIndex) -> Phrase {
        let offset = self.data.len();
        self.data.extend_from_slice(&[1, word]);
        Phrase(offset)
    }

    /// フレーズの単語列を返します。
    #[inline(always)]
    pub fn words(&self, phrase: Phrase) -> &[WordIndex] {
        let len = usize::from_u32(self.data[phrase.0]);
        &self.data[phrase.0 + 1..phrase.0 + 1 + len]
    }

    /// プールが使用している語数（長さ欄を含む）を返します。
    #[inline(always)]
    pub fn used(&self) -> usize {
        self.data.len()
    }

    /// すべてのフレーズを破棄します。既存のハンドルは無効になります。
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_continue() {
        let mut pool = PhrasePool::new();
        let p = pool.allocate();
        pool.continue_with(p, 5);
        pool.continue_with(p, 7);
        let q = pool.single(9);
        let r = pool.push_words([1, 2, 3]);
        let empty = pool.allocate();

        assert_eq!(pool.words(p), &[5, 7]);
        assert_eq!(pool.words(q), &[9]);
        assert_eq!(pool.words(r), &[1, 2, 3]);
        assert!(pool.words(empty).is_empty());
        assert_eq!(pool.used(), 3 + 2 + 4 + 1);
    }

    #[test]
    #[should_panic(expected = "only the most recent phrase can be extended")]
    fn test_continue_stale_phrase() {
        let mut pool = PhrasePool::new();
        let p = pool.allocate();
        pool.single(1);
        pool.continue_with(p, 2);
    }
}
