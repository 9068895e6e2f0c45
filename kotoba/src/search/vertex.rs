use crate::search::{Hypothesis, TieBreak};

/// 競合する仮説の集合
///
/// [`init_root`](Self::init_root) で開き、[`append_hypothesis`](Self::append_hypothesis)
/// で仮説を追加し、[`finish_root`](Self::finish_root) で整列・枝刈りして確定します。
#[derive(Clone, Debug, Default)]
pub struct Vertex {
    hypotheses: Vec<Hypothesis>,
    finished: bool,
}

impl Vertex {
    /// 空の頂点を作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 仮説リストを空にして追加可能な状態にします。
    pub fn init_root(&mut self) {
        self.hypotheses.clear();
        self.finished = false;
    }

    /// 仮説を追加し、その位置を返します。
    pub fn append_hypothesis(&mut self, hypothesis: Hypothesis) -> usize {
        debug_assert!(!self.finished, "appending to a finished vertex");
        self.hypotheses.push(hypothesis);
        self.hypotheses.len() - 1
    }

    /// 仮説をスコアの降順に整列し、`limit` 個に枝刈りして確定します。
    pub fn finish_root(&mut self, policy: TieBreak, limit: Option<usize>) {
        if policy == TieBreak::Right {
            self.hypotheses.reverse();
        }
        // Stable, so ties keep the order chosen above.
        self.hypotheses
            .sort_by(|a, b| b.score().total_cmp(&a.score()));
        if let Some(limit) = limit {
            self.hypotheses.truncate(limit);
        }
        self.finished = true;
    }

    /// 確定済みかどうかを返します。
    #[inline(always)]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 仮説のリストを返します。確定後はスコアの降順です。
    #[inline(always)]
    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.hypotheses
    }

    /// 最良の仮説を返します。
    #[inline(always)]
    pub fn best(&self) -> Option<&Hypothesis> {
        debug_assert!(self.finished);
        self.hypotheses.first()
    }

    /// 仮説の数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.hypotheses.len()
    }

    /// 仮説がない場合に `true` を返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.hypotheses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::lm::LmState;
    use crate::search::History;

    fn hyp(score: f32, tag: u32) -> Hypothesis {
        Hypothesis::new(score, LmState::from_words(&[tag]), History::Start)
    }

    fn tags(vertex: &Vertex) -> Vec<u32> {
        vertex
            .hypotheses()
            .iter()
            .map(|h| h.state().words()[0])
            .collect()
    }

    #[test]
    fn test_finish_sorts_descending() {
        let mut vertex = Vertex::new();
        vertex.init_root();
        vertex.append_hypothesis(hyp(-3.0, 1));
        vertex.append_hypothesis(hyp(-1.0, 2));
        vertex.append_hypothesis(hyp(-2.0, 3));
        vertex.finish_root(TieBreak::Left, None);
        assert!(vertex.is_finished());
        assert_eq!(tags(&vertex), vec![2, 3, 1]);
        assert_eq!(vertex.best().map(Hypothesis::score), Some(-1.0));
    }

    #[test]
    fn test_finish_prunes() {
        let mut vertex = Vertex::new();
        vertex.init_root();
        for i in 0..10 {
            vertex.append_hypothesis(hyp(i as f32, i));
        }
        vertex.finish_root(TieBreak::Left, Some(3));
        assert_eq!(tags(&vertex), vec![9, 8, 7]);
    }

    #[test]
    fn test_tie_break() {
        let mut left = Vertex::new();
        let mut right = Vertex::new();
        for vertex in [&mut left, &mut right] {
            vertex.init_root();
            vertex.append_hypothesis(hyp(0.0, 1));
            vertex.append_hypothesis(hyp(0.0, 2));
            vertex.append_hypothesis(hyp(1.0, 3));
        }
        left.finish_root(TieBreak::Left, None);
        right.finish_root(TieBreak::Right, None);
        assert_eq!(tags(&left), vec![3, 1, 2]);
        assert_eq!(tags(&right), vec![3, 2, 1]);
    }

    #[test]
    fn test_init_root_reopens() {
        let mut vertex = Vertex::new();
        vertex.init_root();
        vertex.append_hypothesis(hyp(0.0, 1));
        vertex.finish_root(TieBreak::Left, None);
        vertex.init_root();
        assert!(vertex.is_empty());
        assert!(!vertex.is_finished());
    }
}
