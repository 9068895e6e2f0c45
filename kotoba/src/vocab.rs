//! 語彙（文字列からIDへのインターン）モジュール
//!
//! このモジュールは、文字列を密な整数IDに対応付ける語彙データ構造を提供します。
//! フレーズテーブルと探索グラフはどちらもこの語彙層の上に構築されます。
//!
//! - [`MutableVocab`]: 探索中も挿入可能な語彙（`find_or_insert`）
//! - [`SortedVocabulary`]: ハッシュ値でソートされた読み取り専用語彙（二分探索）
//! - [`ProbingVocabulary`]: オープンアドレス法による読み取り専用語彙
//! - [`SentenceVocab`]: 共有語彙の上に一文ぶんの語を追加するオーバーレイ
//!
//! ID 0 は常に未知語 `<unk>` に予約されています。

mod mutable;
mod overlay;
mod probing;
mod sorted;

use crate::errors::{KotobaError, Result};
use crate::utils::hash_bytes;

pub use crate::vocab::mutable::MutableVocab;
pub use crate::vocab::overlay::SentenceVocab;
pub use crate::vocab::probing::ProbingVocabulary;
pub use crate::vocab::sorted::SortedVocabulary;

/// 語彙内の単語ID
pub type WordIndex = u32;

/// 未知語に予約されたID
pub const UNK: WordIndex = 0;

/// 未知語の文字列表現
pub const UNK_WORD: &str = "<unk>";

/// 文頭記号
pub const BOS_WORD: &str = "<s>";

/// 文末記号
pub const EOS_WORD: &str = "</s>";

/// 語彙検索のためのハッシュ値を計算します。
#[inline(always)]
pub fn hash_for_vocab(word: &str) -> u64 {
    hash_bytes(word.as_bytes())
}

/// 読み取り専用の語彙インターフェース
pub trait Vocabulary {
    /// 文字列のIDを返します。存在しない場合は[`UNK`]を返します。
    fn index(&self, word: &str) -> WordIndex;

    /// IDの排他的上限を返します。IDは `[0, bound())` の範囲に収まります。
    fn bound(&self) -> WordIndex;

    /// 読み込み中に `<unk>` が出現したかどうかを返します。
    fn saw_unk(&self) -> bool;

    /// 見つからなかった場合のIDを返します。
    #[inline(always)]
    fn not_found(&self) -> WordIndex {
        UNK
    }

    /// 文頭記号のIDを返します。
    #[inline(always)]
    fn begin_sentence(&self) -> WordIndex {
        self.index(BOS_WORD)
    }

    /// 文末記号のIDを返します。
    #[inline(always)]
    fn end_sentence(&self) -> WordIndex {
        self.index(EOS_WORD)
    }
}

/// 読み込み後に固定される語彙
///
/// `insert` で語を登録し、`finished_loading` を呼んだ後は検索のみ可能になります。
pub trait LoadableVocabulary: Vocabulary + Sized {
    /// 想定される語数を指定して空の語彙を作成します。
    fn with_capacity(entries: usize) -> Self;

    /// 語を登録し、仮のIDを返します。
    ///
    /// [`SortedVocabulary`] では `finished_loading` 後にIDが振り直されるため、
    /// 確定したIDは [`Vocabulary::index`] で取得してください。
    fn insert(&mut self, word: &str) -> Result<WordIndex>;

    /// 読み込みを完了し、語彙を固定します。
    ///
    /// `enumerate` が指定された場合、確定したIDの順に全単語を通知します。
    fn finished_loading(&mut self, enumerate: Option<&mut dyn EnumerateVocab>) -> Result<()>;

    /// 読み込みが完了しているかどうかを返します。
    fn is_finished(&self) -> bool;
}

/// 語彙の確定時に `(ID, 単語)` の組を受け取るコールバック
pub trait EnumerateVocab {
    /// 単語を1つ受け取ります。
    fn add(&mut self, index: WordIndex, word: &str);
}

impl EnumerateVocab for Vec<(WordIndex, String)> {
    fn add(&mut self, index: WordIndex, word: &str) {
        self.push((index, word.to_string()));
    }
}

/// 必須の特殊語（`<unk>`、`<s>`、`</s>`）が揃っているかを検査します。
///
/// # エラー
///
/// いずれかが欠けている場合、[`KotobaError::MissingSpecialWord`] を返します。
pub fn check_specials<V>(vocab: &V) -> Result<()>
where
    V: Vocabulary + ?Sized,
{
    if !vocab.saw_unk() {
        return Err(KotobaError::MissingSpecialWord { word: UNK_WORD });
    }
    if vocab.begin_sentence() == vocab.not_found() {
        return Err(KotobaError::MissingSpecialWord { word: BOS_WORD });
    }
    if vocab.end_sentence() == vocab.not_found() {
        return Err(KotobaError::MissingSpecialWord { word: EOS_WORD });
    }
    Ok(())
}
