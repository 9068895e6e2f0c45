//! 探索グラフとキューブ枝刈り
//!
//! 一文ぶんの翻訳仮説をハイパーグラフとして表現し、
//! 枝刈り予算（ポップ上限）のもとで最良の導出を求めます。
//!
//! 単調なフレーズベース翻訳では、グラフは次の形をとります。
//!
//! - 接頭辞頂点 `0..=n`: 原言語の単語 `[0, k)` を翻訳し終えた状態
//! - 区間 `[i, j)` とそのフレーズ頂点ごとのエッジ: 規則 `[NT, NT]`、
//!   子は接頭辞頂点 `i` とフレーズ頂点
//! - ルート頂点: 接頭辞頂点 `n` を子に持つ規則 `[NT]` のエッジ。文末の再スコアリングを行う
//!
//! 頂点の仮説リストは [`Vertex::init_root`] から [`Vertex::finish_root`] までの間だけ
//! 変更でき、確定後は読み取り専用になります。

mod context;
mod cube;
mod edge;
mod graph;
mod hypothesis;
mod vertex;

pub use crate::search::context::Context;
pub use crate::search::cube::search;
pub use crate::search::edge::{Child, Edge, RuleItem};
pub use crate::search::graph::{Graph, Layout};
pub use crate::search::hypothesis::{History, Hypothesis};
pub use crate::search::vertex::Vertex;

use crate::alloc::Id;

/// エッジが持てる子頂点の最大数
pub const MAX_ARITY: usize = 2;

/// 既定のポップ上限
pub const DEFAULT_POP_LIMIT: usize = 1000;

/// グラフが所有する頂点のID
pub type VertexId = Id<Vertex>;

/// グラフが所有するエッジのID
pub type EdgeId = Id<Edge>;

/// 同じスコアの仮説を並べる順序
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TieBreak {
    /// 先に追加された仮説を前に置きます。
    #[default]
    Left,
    /// 後に追加された仮説を前に置きます。
    Right,
}
