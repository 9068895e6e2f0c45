use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};

use crate::alloc::{Id, NodePool};
use crate::errors::Result;
use crate::lm::LmState;
use crate::search::{DEFAULT_POP_LIMIT, EdgeId, Hypothesis, MAX_ARITY, TieBreak};

/// キューブ内のセル: エッジと、各子頂点で選ぶ仮説の位置
#[derive(Clone, Copy, Debug)]
pub(crate) struct PartialEdge {
    pub(crate) edge: EdgeId,
    pub(crate) indices: [u32; MAX_ARITY],
}

/// 優先度付きキュー内のアイテム
#[derive(Debug)]
pub(crate) struct QueueItem {
    /// 子の仮説スコアの和による見積もり
    pub(crate) estimate: f32,
    pub(crate) node: Id<PartialEdge>,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on the estimate; older nodes first on ties.
        self.estimate
            .total_cmp(&other.estimate)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// 探索の作業領域
///
/// ポップ上限と、キューブ枝刈りで使うノードプールやキューを保持します。
/// 文をまたいで再利用することで確保のコストを抑えます。
pub struct Context {
    pub(crate) pop_limit: usize,
    pub(crate) tie_break: TieBreak,
    pub(crate) nodes: NodePool<PartialEdge>,
    pub(crate) queue: BinaryHeap<QueueItem>,
    pub(crate) seen: HashSet<(EdgeId, [u32; MAX_ARITY])>,
    pub(crate) recombine: HashMap<LmState, Vec<u32>>,
    pub(crate) candidates: Vec<Hypothesis>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(DEFAULT_POP_LIMIT)
    }
}

impl Context {
    /// ポップ上限を指定して作業領域を作成します。
    pub fn new(pop_limit: usize) -> Self {
        Self {
            pop_limit,
            tie_break: TieBreak::Left,
            nodes: NodePool::new(),
            queue: BinaryHeap::new(),
            seen: HashSet::new(),
            recombine: HashMap::new(),
            candidates: vec![],
        }
    }

    /// 同点の仮説の順序を設定します。
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// ポップ上限を返します。
    #[inline(always)]
    pub fn pop_limit(&self) -> usize {
        self.pop_limit
    }

    /// 生存中のキューブノード数を返します。
    #[inline(always)]
    pub fn live_nodes(&self) -> usize {
        self.nodes.live()
    }

    /// 1頂点ぶんの作業状態を破棄します。
    pub(crate) fn clear(&mut self) {
        while let Some(item) = self.queue.pop() {
            self.nodes.destroy(item.node);
        }
        self.seen.clear();
        self.recombine.clear();
        self.candidates.clear();
    }

    /// セルをプールに確保してキューに入れます。
    pub(crate) fn push(&mut self, cell: PartialEdge, estimate: f32) -> Result<()> {
        if !self.seen.insert((cell.edge, cell.indices)) {
            return Ok(());
        }
        let node = self.nodes.construct(cell)?;
        self.queue.push(QueueItem { estimate, node });
        Ok(())
    }

    /// 最も見積もりの高いセルを取り出し、ノードをプールに返します。
    pub(crate) fn pop(&mut self) -> Option<PartialEdge> {
        while let Some(item) = self.queue.pop() {
            if let Some(cell) = self.nodes.destroy(item.node) {
                return Some(cell);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_order_and_dedup() {
        let mut context = Context::new(10);
        let edge = Id::new(0);
        context.push(PartialEdge { edge, indices: [0, 0] }, -2.0).unwrap();
        context.push(PartialEdge { edge, indices: [0, 1] }, -1.0).unwrap();
        context.push(PartialEdge { edge, indices: [0, 1] }, 5.0).unwrap();
        context.push(PartialEdge { edge, indices: [1, 0] }, -3.0).unwrap();
        assert_eq!(context.live_nodes(), 3);

        let order: Vec<_> = std::iter::from_fn(|| context.pop())
            .map(|cell| cell.indices)
            .collect();
        assert_eq!(order, vec![[0, 1], [0, 0], [1, 0]]);
        assert_eq!(context.live_nodes(), 0);
    }

    #[test]
    fn test_clear_returns_nodes() {
        let mut context = Context::new(10);
        let edge = Id::new(1);
        context.push(PartialEdge { edge, indices: [0, 0] }, 0.0).unwrap();
        context.push(PartialEdge { edge, indices: [1, 0] }, 0.0).unwrap();
        context.clear();
        assert_eq!(context.live_nodes(), 0);
        assert!(context.queue.is_empty());
        context.push(PartialEdge { edge, indices: [0, 0] }, 0.0).unwrap();
        assert_eq!(context.live_nodes(), 1);
    }
}
