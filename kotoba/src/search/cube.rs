//! キューブ枝刈り
//!
//! 頂点に入る各エッジについて、子頂点の仮説リスト（スコア降順）の直積を
//! 「キューブ」とみなし、左上のセルから順に見積もりの高いセルを取り出します。
//! 取り出したセルは目的関数で正確にスコアリングされ、隣接するセルがキューに追加されます。
//! 取り出しの回数はポップ上限で打ち切られます。

use crate::errors::{KotobaError, Result};
use crate::scorer::{Objective, PhrasePair, SourcePhrase};
use crate::search::context::PartialEdge;
use crate::search::{Context, EdgeId, Graph, History, Hypothesis, VertexId};
use crate::utils::FromU32;

/// 入力文全体を探索し、ルート頂点の仮説を確定します。
///
/// グラフは [`Graph::build_monotone`] で構築され、接頭辞頂点を左から順に展開します。
pub fn search(context: &mut Context, objective: &Objective, graph: &mut Graph<'_>) -> Result<()> {
    if context.pop_limit == 0 {
        return Err(KotobaError::invalid_argument(
            "pop_limit",
            "must be at least 1",
        ));
    }
    let layout = graph.build_monotone(objective)?;
    for (prefix, incoming) in layout.prefixes.iter().zip(&layout.incoming).skip(1) {
        expand_vertex(context, objective, graph, *prefix, incoming)?;
    }
    let root = graph
        .root()
        .ok_or_else(|| KotobaError::invalid_state("graph has no root", "build_monotone"))?;
    finish_sentence(context, objective, graph, root, layout.root_edge)
}

fn cell_estimate(graph: &Graph<'_>, cell: &PartialEdge) -> Option<f32> {
    let edge = graph.edge(cell.edge);
    let mut estimate = 0.0;
    for (k, &index) in cell.indices.iter().enumerate().take(edge.arity()) {
        let hypothesis = graph
            .child(edge.child(k)?)
            .hypotheses()
            .get(usize::from_u32(index))?;
        estimate += hypothesis.score();
    }
    Some(estimate)
}

fn push_cell(context: &mut Context, graph: &Graph<'_>, cell: PartialEdge) -> Result<()> {
    match cell_estimate(graph, &cell) {
        Some(estimate) => context.push(cell, estimate),
        None => Ok(()),
    }
}

/// セルを正確にスコアリングして仮説を作ります。
fn score_cell(objective: &Objective, graph: &Graph<'_>, cell: &PartialEdge) -> Result<Hypothesis> {
    let edge = graph.edge(cell.edge);
    let malformed =
        || KotobaError::invalid_state("malformed phrase edge", format!("{:?}", cell.edge));
    let left_child = edge.child(0).ok_or_else(malformed)?;
    let right_child = edge.child(1).ok_or_else(malformed)?;
    let left = &graph.child(left_child).hypotheses()[usize::from_u32(cell.indices[0])];
    let right = &graph.child(right_child).hypotheses()[usize::from_u32(cell.indices[1])];
    let History::Phrase { phrase, .. } = *right.history() else {
        return Err(malformed());
    };

    let (begin, end) = edge.span();
    let source = SourcePhrase::new(graph.source(), begin, end);
    let pair = PhrasePair {
        source,
        target: graph.phrase_words(right_child, phrase),
    };
    let with_source = objective.score_hypothesis_with_source_phrase(left, source, None);
    let (with_pair, state) = objective.score_hypothesis_with_phrase_pair(left, pair, None);
    Ok(Hypothesis::new(
        left.score() + right.score() + with_source + with_pair,
        state,
        History::Derivation {
            edge: cell.edge,
            children: cell.indices,
        },
    ))
}

/// 仮説を候補に加えます。区別できない仮説がすでにあれば、スコアの高い方を残します。
fn recombine(context: &mut Context, objective: &Objective, hypothesis: Hypothesis) -> Result<()> {
    let bucket = context.recombine.entry(*hypothesis.state()).or_default();
    for &i in bucket.iter() {
        let existing = &mut context.candidates[usize::from_u32(i)];
        if objective.hypothesis_equal(existing, &hypothesis) {
            if hypothesis.score() > existing.score() {
                *existing = hypothesis;
            }
            return Ok(());
        }
    }
    bucket.push(u32::try_from(context.candidates.len())?);
    context.candidates.push(hypothesis);
    Ok(())
}

/// 1つの頂点に入るエッジ群からキューブ枝刈りで仮説を生成し、頂点を確定します。
pub(crate) fn expand_vertex(
    context: &mut Context,
    objective: &Objective,
    graph: &mut Graph<'_>,
    vertex: VertexId,
    incoming: &[EdgeId],
) -> Result<()> {
    context.clear();
    for &edge in incoming {
        push_cell(context, graph, PartialEdge {
            edge,
            indices: [0, 0],
        })?;
    }

    let mut pops = 0;
    while pops < context.pop_limit {
        let Some(cell) = context.pop() else {
            break;
        };
        let hypothesis = score_cell(objective, graph, &cell)?;
        recombine(context, objective, hypothesis)?;

        let arity = graph.edge(cell.edge).arity();
        for k in 0..arity {
            let mut next = cell;
            next.indices[k] += 1;
            push_cell(context, graph, next)?;
        }
        pops += 1;
    }

    let target = graph.vertex_mut(vertex);
    target.init_root();
    for hypothesis in context.candidates.drain(..) {
        target.append_hypothesis(hypothesis);
    }
    target.finish_root(context.tie_break, Some(context.pop_limit));
    log::trace!("vertex {vertex:?}: {pops} pops, {} hypotheses", target.len());
    context.clear();
    Ok(())
}

/// ルート頂点に文末の再スコアリングを適用した完成仮説を集めます。
fn finish_sentence(
    context: &mut Context,
    objective: &Objective,
    graph: &mut Graph<'_>,
    root: VertexId,
    root_edge: EdgeId,
) -> Result<()> {
    let child = graph
        .edge(root_edge)
        .child(0)
        .ok_or_else(|| KotobaError::invalid_state("root edge has no child", "build_monotone"))?;

    context.candidates.clear();
    for (i, hypothesis) in graph.child(child).hypotheses().iter().enumerate() {
        let score = hypothesis.score() + objective.rescore_hypothesis(hypothesis, None);
        context.candidates.push(Hypothesis::new(
            score,
            *hypothesis.state(),
            History::Derivation {
                edge: root_edge,
                children: [u32::try_from(i)?, 0],
            },
        ));
    }

    let target = graph.vertex_mut(root);
    target.init_root();
    for hypothesis in context.candidates.drain(..) {
        target.append_hypothesis(hypothesis);
    }
    target.finish_root(context.tie_break, Some(context.pop_limit));
    Ok(())
}
