//! アリーナ型アロケータ
//!
//! 探索中に大量に生成される小さなデータを、個別の解放コストなしに
//! 確保するためのアロケータ群を提供します。
//!
//! - [`PhrasePool`]: 可変長フレーズを長さ前置きで連続領域に格納するプール
//! - [`FixedAllocator`]: 要素数を事前に確定し、一度だけ確保する固定長配列
//! - [`NodePool`]: 空きリストで要素を再利用するノードプール
//!
//! 確保した要素は生ポインタではなく型付きインデックス [`Id`] で参照します。

mod fixed;
mod node_pool;
mod pool;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub use crate::alloc::fixed::FixedAllocator;
pub use crate::alloc::node_pool::NodePool;
pub use crate::alloc::pool::{Phrase, PhrasePool};

/// アロケータ内の要素を指す型付きインデックス
///
/// `T` は要素型を示すだけで、異なるアロケータのIDを混同しないために使われます。
pub struct Id<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    #[inline(always)]
    pub(crate) const fn new(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// 配列上の位置を返します。
    #[inline(always)]
    pub fn index(self) -> usize {
        self.raw as usize
    }

    /// 内部の値を返します。
    #[inline(always)]
    pub const fn raw(self) -> u32 {
        self.raw
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.raw)
    }
}
