//! ユーティリティ関数と型変換トレイトを提供するモジュール
//!
//! このモジュールには、ハッシュ計算、型変換、フィールド分割などのヘルパー関数が含まれています。
//! 主に以下の機能を提供します：
//!
//! - `FromU32`: u32からの型変換トレイト
//! - 文字列と単語ID列の64ビットハッシュ
//! - `|||` 区切りのフィールド分割

use xxhash_rust::xxh64::{Xxh64, xxh64};

use crate::vocab::WordIndex;

/// ハッシュ計算に使用するシード値
const HASH_SEED: u64 = 0;

/// フレーズテーブルのフィールド区切り文字列
pub const FIELD_DELIMITER: &str = "|||";

/// u32から他の型への変換を提供するトレイト
///
/// このトレイトは、u32値を実装型に変換する機能を定義します。
/// 標準ライブラリのFromトレイトとは異なり、特定の最適化や
/// プラットフォーム固有の仮定を行うことができます。
pub trait FromU32 {
    /// u32値から実装型を生成する
    fn from_u32(src: u32) -> Self;
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl FromU32 for usize {
    /// u32値をusizeに変換する
    ///
    /// ポインタ幅が32ビットまたは64ビットであることが保証されているため、
    /// この変換は常に成功します。
    #[inline(always)]
    fn from_u32(src: u32) -> Self {
        // Since the pointer width is guaranteed to be 32 or 64,
        // the following process always succeeds.
        unsafe { Self::try_from(src).unwrap_unchecked() }
    }
}

/// バイト列の64ビットハッシュを計算します。
///
/// 順序に依存し、内容のみで決まる非暗号学的ハッシュです。
#[inline(always)]
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    xxh64(bytes, HASH_SEED)
}

/// 単語ID列の生バイト表現に対する64ビットハッシュを計算します。
///
/// テキストではなくID列そのものをハッシュするため、
/// 同じ単語列は空白の違いに関係なく同じキーになります。
pub fn hash_words(words: &[WordIndex]) -> u64 {
    let mut hasher = Xxh64::new(HASH_SEED);
    for word in words {
        hasher.update(&word.to_le_bytes());
    }
    hasher.digest()
}

/// `|||` で区切られた行をトリムされたフィールドに分割します。
///
/// # 例
///
/// ```
/// # use kotoba::utils::split_fields;
/// let fields: Vec<_> = split_fields("a b ||| x y ||| -1.0").collect();
/// assert_eq!(fields, vec!["a b", "x y", "-1.0"]);
/// ```
pub fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(FIELD_DELIMITER).map(str::trim)
}
