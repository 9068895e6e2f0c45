use crate::errors::KotobaError;
use crate::phrase_table::PhraseTable;
use crate::scorer::Objective;
use crate::search::Graph;
use crate::vocab::MutableVocab;

#[test]
fn test_graph_capacity() {
    let mut vocab = MutableVocab::new();
    let table = PhraseTable::from_reader("".as_bytes(), &mut vocab, &Objective::new()).unwrap();
    let mut graph = Graph::new(&table, &vocab);
    graph.set_counts(2, 1).unwrap();

    graph.new_vertex().unwrap();
    graph.new_vertex().unwrap();
    graph.new_edge().unwrap();
    assert_eq!(graph.num_vertices(), 2);
    assert_eq!(graph.num_edges(), 1);

    match graph.new_vertex() {
        Err(KotobaError::CapacityExceeded { capacity, .. }) => assert_eq!(capacity, 2),
        _ => panic!("expected capacity error"),
    }
    assert!(matches!(
        graph.new_edge(),
        Err(KotobaError::CapacityExceeded { capacity: 1, .. })
    ));
}

#[test]
fn test_set_counts_twice() {
    let mut vocab = MutableVocab::new();
    let table = PhraseTable::from_reader("".as_bytes(), &mut vocab, &Objective::new()).unwrap();
    let mut graph = Graph::new(&table, &vocab);
    graph.set_counts(1, 1).unwrap();
    assert!(graph.set_counts(1, 1).is_err());
}

#[test]
fn test_build_counts_are_exact() {
    let objective = Objective::new();
    let mut vocab = MutableVocab::new();
    let table = PhraseTable::from_reader(
        "a ||| x ||| 0\na b ||| x y ||| 0\n".as_bytes(),
        &mut vocab,
        &objective,
    )
    .unwrap();
    let mut graph = Graph::new(&table, &vocab);
    graph.set_source("a b c".split(' ')).unwrap();
    let layout = graph.build_monotone(&objective).unwrap();

    // 4 prefixes, passthroughs for "b" and "c", and the root.
    assert_eq!(graph.num_vertices(), 4 + 2 + 1);
    // "a", "a b", two passthrough spans, and the root edge.
    assert_eq!(graph.num_edges(), 5);
    assert_eq!(layout.incoming[2].len(), 2);
    assert!(graph.new_vertex().is_err());
}
