//! 空きリスト付きノードプール

use crate::alloc::Id;
use crate::errors::{KotobaError, Result};
use crate::utils::FromU32;

/// 解放されたスロットを再利用するノードプール
///
/// 構築と破棄を繰り返しても一般のメモリ確保を伴いません。
/// 破棄されたスロットのIDは次の構築で再利用されます。
#[derive(Debug)]
pub struct NodePool<T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Default for NodePool<T> {
    fn default() -> Self {
        Self {
            slots: vec![],
            free: vec![],
        }
    }
}

impl<T> NodePool<T> {
    /// 空のプールを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// ノードを構築し、そのIDを返します。
    ///
    /// # エラー
    ///
    /// スロット数が32ビットのIDで表せる数を超える場合、エラーを返します。
    pub fn construct(&mut self, value: T) -> Result<Id<T>> {
        if let Some(raw) = self.free.pop() {
            let slot = &mut self.slots[usize::from_u32(raw)];
            debug_assert!(slot.is_none());
            *slot = Some(value);
            return Ok(Id::new(raw));
        }
        let raw = u32::try_from(self.slots.len()).map_err(|_| KotobaError::CapacityExceeded {
            what: "cube nodes",
            capacity: usize::from_u32(u32::MAX),
        })?;
        self.slots.push(Some(value));
        Ok(Id::new(raw))
    }

    /// ノードを破棄してプールに返し、その値を取り出します。
    ///
    /// すでに破棄されたIDに対しては何もせず `None` を返します。
    pub fn destroy(&mut self, id: Id<T>) -> Option<T> {
        let value = self.slots.get_mut(id.index())?.take()?;
        self.free.push(id.raw());
        Some(value)
    }

    /// ノードへの参照を返します。
    #[inline(always)]
    pub fn get(&self, id: Id<T>) -> Option<&T> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// 生存中のノード数を返します。
    #[inline(always)]
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// これまでに確保したスロット数を返します。
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// すべてのノードを破棄します。確保済みの領域は保持されます。
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuse_slots() {
        let mut pool = NodePool::new();
        let a = pool.construct("a").unwrap();
        let b = pool.construct("b").unwrap();
        assert_eq!(pool.live(), 2);
        assert_eq!(pool.destroy(a), Some("a"));
        assert_eq!(pool.live(), 1);
        let c = pool.construct("c").unwrap();
        assert_eq!(c, a);
        assert_eq!(pool.get(c), Some(&"c"));
        assert_eq!(pool.get(b), Some(&"b"));
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn test_double_destroy() {
        let mut pool = NodePool::new();
        let a = pool.construct(1).unwrap();
        assert_eq!(pool.destroy(a), Some(1));
        assert_eq!(pool.destroy(a), None);
        assert_eq!(pool.live(), 0);
    }
}
