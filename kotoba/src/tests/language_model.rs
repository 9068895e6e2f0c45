use crate::decoder::Decoder;
use crate::lm::BackoffModel;
use crate::phrase_table::PhraseTable;
use crate::scorer::{
    LanguageModelFeature, Objective, Passthrough, TableScores, Weights, WordPenalty,
};
use crate::search::TieBreak;
use crate::vocab::{MutableVocab, ProbingVocabulary, SortedVocabulary};

const ARPA: &str = include_str!("./resources/bigram.arpa");
const PHRASE_TABLE: &str = include_str!("./resources/phrase_table.txt");
const WEIGHTS: &str = include_str!("./resources/weights.txt");

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

fn decoder(lm_weight: f32) -> Decoder {
    let mut vocab = MutableVocab::new();
    let model = BackoffModel::<SortedVocabulary>::from_reader(ARPA.as_bytes(), &mut vocab).unwrap();

    let mut objective = Objective::new();
    objective.add_feature(LanguageModelFeature::new(model));
    objective.add_feature(TableScores::new(1));
    objective.add_feature(Passthrough);
    objective.add_feature(WordPenalty);
    let mut weights = Weights::from_reader(WEIGHTS.as_bytes()).unwrap();
    weights.insert("lm", lm_weight);
    objective.load_weights(&weights);

    let table = PhraseTable::from_reader(PHRASE_TABLE.as_bytes(), &mut vocab, &objective).unwrap();
    Decoder::new(vocab, table, objective)
}

#[test]
fn test_language_model_changes_choice() {
    let mut worker = decoder(0.0).new_worker();
    worker.reset_sentence("a b");
    worker.decode().unwrap();
    assert_eq!(worker.best().unwrap().text(), "x z");

    let mut worker = decoder(1.0).new_worker();
    worker.reset_sentence("a b");
    worker.decode().unwrap();
    let best = worker.best().unwrap();
    assert_eq!(best.text(), "x y");
    // table -2.0, lm p(x|<s>) + p(y|x) + p(</s>|y)
    assert!(approx(best.score(), -2.0 - 0.2 - 0.3 - 0.4));
}

#[test]
fn test_nbest_keeps_distinct_states() {
    let decoder = decoder(1.0).nbest(3).unwrap();
    let mut worker = decoder.new_worker();
    worker.reset_sentence("a b");
    worker.decode().unwrap();

    let texts: Vec<_> = worker.translations().iter().map(|t| t.text()).collect();
    assert_eq!(texts, vec!["x y", "x z"]);
    // table -1.9, lm p(x|<s>) + bo(x) p(z) + p(</s>|z)
    assert!(approx(worker.translation(1).unwrap().score(), -1.9 - 0.2 - 1.5 - 0.9));
}

#[test]
fn test_detail_with_language_model() {
    let decoder = decoder(1.0).detail(true);
    let mut worker = decoder.new_worker();
    worker.reset_sentence("a b");
    worker.decode().unwrap();

    let best = worker.best().unwrap();
    let dense = best.features().unwrap().dense();
    assert_eq!(
        decoder.model().objective().feature_descriptions(),
        vec!["lm", "phrase_table_0", "passthrough", "word_penalty"]
    );
    assert!(approx(dense[0], -0.9));
    assert!(approx(dense[1], -2.0));
    assert_eq!(dense[2], 0.0);
    assert_eq!(dense[3], -2.0);
}

#[test]
fn test_passthrough_is_unknown_to_language_model() {
    let mut vocab = MutableVocab::new();
    let model =
        BackoffModel::<ProbingVocabulary>::from_reader(ARPA.as_bytes(), &mut vocab).unwrap();
    let mut objective = Objective::new();
    objective.add_feature(LanguageModelFeature::new(model));
    objective.add_feature(Passthrough);
    objective.set_weight(0, 1.0).unwrap();
    let table =
        PhraseTable::from_reader("a ||| x ||| 0".as_bytes(), &mut vocab, &objective).unwrap();

    let decoder = Decoder::new(vocab, table, objective);
    let mut worker = decoder.new_worker();
    worker.reset_sentence("a q");
    worker.decode().unwrap();
    let best = worker.best().unwrap();
    assert_eq!(best.text(), "x q");
    // p(x|<s>) + p(<unk>|x) + p(</s>) with the state reset by <unk>
    assert!(approx(best.score(), -0.2 + (-0.3 - 1.0) - 0.7));
}

#[test]
fn test_tie_break_picks_recombination_survivor() {
    // p and q score the same everywhere; both end in the state [r].
    let arpa = "\\data\\\nngram 1=6\nngram 2=1\n\n\\1-grams:\n\
                -1.0\t<unk>\n-99\t<s>\n-0.5\t</s>\n-0.5\tp\n-0.5\tq\n-0.5\tr\n\n\
                \\2-grams:\n-0.1\tr </s>\n\n\\end\\\n";
    let mut vocab = MutableVocab::new();
    let model = BackoffModel::<SortedVocabulary>::from_reader(arpa.as_bytes(), &mut vocab).unwrap();
    let mut objective = Objective::new();
    objective.add_feature(LanguageModelFeature::new(model));
    objective.add_feature(TableScores::new(1));
    objective.set_weight(0, 1.0).unwrap();
    objective.set_weight(1, 1.0).unwrap();
    let table = PhraseTable::from_reader(
        "a ||| p ||| -1\na ||| q ||| -1\nb ||| r ||| -1".as_bytes(),
        &mut vocab,
        &objective,
    )
    .unwrap();

    let decoder = Decoder::new(vocab, table, objective).nbest(2).unwrap();
    assert_eq!(decoder.get_tie_break(), TieBreak::Left);
    let mut worker = decoder.new_worker();
    worker.reset_sentence("a b");
    worker.decode().unwrap();
    assert_eq!(worker.num_translations(), 1);
    assert_eq!(worker.best().unwrap().text(), "p r");

    let mut worker = decoder.tie_break(TieBreak::Right).new_worker();
    worker.reset_sentence("a b");
    worker.decode().unwrap();
    assert_eq!(worker.num_translations(), 1);
    let best = worker.best().unwrap();
    assert_eq!(best.text(), "q r");
    assert!(approx(best.score(), -2.0 - 0.5 - 0.5 - 0.1));
}
