//! 固定容量アロケータ

use std::ops::{Index, IndexMut};

use crate::alloc::Id;
use crate::errors::{KotobaError, Result};

/// 要素数を事前に確定して一度だけ確保する配列
///
/// [`init`](Self::init) で容量を決めた後は再確保しません。
/// 容量を超える確保は内部の整合性違反として
/// [`KotobaError::CapacityExceeded`] になります。
#[derive(Debug)]
pub struct FixedAllocator<T> {
    what: &'static str,
    items: Vec<T>,
    capacity: usize,
    initialized: bool,
}

impl<T> FixedAllocator<T> {
    /// 未初期化のアロケータを作成します。
    ///
    /// # 引数
    ///
    /// * `what` - エラーメッセージに使う要素の名前
    pub const fn new(what: &'static str) -> Self {
        Self {
            what,
            items: Vec::new(),
            capacity: 0,
            initialized: false,
        }
    }

    /// 容量を確定して領域を確保します。
    ///
    /// # エラー
    ///
    /// すでに初期化されている場合、エラーを返します。
    pub fn init(&mut self, count: usize) -> Result<()> {
        if self.initialized {
            return Err(KotobaError::invalid_state(
                "FixedAllocator is already initialized",
                self.what,
            ));
        }
        u32::try_from(count)?;
        self.items = Vec::with_capacity(count);
        self.capacity = count;
        self.initialized = true;
        Ok(())
    }

    /// 値を格納し、そのIDを返します。
    ///
    /// # エラー
    ///
    /// 容量を超える場合、[`KotobaError::CapacityExceeded`] を返します。
    pub fn push(&mut self, value: T) -> Result<Id<T>> {
        if self.items.len() >= self.capacity {
            return Err(KotobaError::CapacityExceeded {
                what: self.what,
                capacity: self.capacity,
            });
        }
        let id = Id::new(u32::try_from(self.items.len())?);
        self.items.push(value);
        Ok(id)
    }

    /// 既定値で初期化された次の要素を確保します。
    pub fn alloc(&mut self) -> Result<Id<T>>
    where
        T: Default,
    {
        self.push(T::default())
    }

    /// 確定した容量を返します。
    #[inline(always)]
    pub const fn size(&self) -> usize {
        self.capacity
    }

    /// 確保済みの要素数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 要素が1つも確保されていない場合に `true` を返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 要素への参照を返します。
    #[inline(always)]
    pub fn get(&self, id: Id<T>) -> &T {
        &self.items[id.index()]
    }

    /// 要素への可変参照を返します。
    #[inline(always)]
    pub fn get_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.items[id.index()]
    }

    /// 確保済みの要素をIDとともに列挙します。
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        // init() caps the capacity at u32::MAX, so the counter never overflows.
        (0..).zip(&self.items).map(|(raw, item)| (Id::new(raw), item))
    }
}

impl<T> Index<Id<T>> for FixedAllocator<T> {
    type Output = T;

    fn index(&self, id: Id<T>) -> &T {
        self.get(id)
    }
}

impl<T> IndexMut<Id<T>> for FixedAllocator<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        self.get_mut(id)
    }
}
