//! ARPA形式のバックオフn-gramモデル
//!
//! ARPA テキストをメモリ上のハッシュ表に読み込みます。
//! 1-gramはモデル自身の語彙 `V` に登録され、2-gram以上は
//! 新しい順に並べた単語ID列のハッシュ値をキーに格納されます。

use std::io::{BufRead, BufReader, Read};

use hashbrown::HashMap;

use crate::errors::{KotobaError, Result};
use crate::lm::{LanguageModel, LmState, MAX_ORDER};
use crate::utils::{FromU32, hash_words};
use crate::vocab::{
    BOS_WORD, EOS_WORD, LoadableVocabulary, MutableVocab, UNK, Vocabulary, WordIndex,
    check_specials,
};

#[derive(Clone, Copy, Debug, Default)]
struct NGram {
    log_prob: f32,
    backoff: f32,
}

/// ARPA形式のバックオフ言語モデル
///
/// スコアは常用対数です。
pub struct BackoffModel<V> {
    vocab: V,
    order: usize,
    unigrams: Vec<NGram>,
    // higher[n - 2] holds the n-grams keyed by their words newest first.
    higher: Vec<HashMap<u64, NGram>>,
    // Decoder word id to model word id.
    to_lm: Vec<WordIndex>,
    begin_sentence: WordIndex,
    end_sentence: WordIndex,
}

enum Section {
    Preamble,
    Counts,
    NGrams(usize),
    End,
}

fn parse_error(line_no: usize, msg: impl std::fmt::Display) -> KotobaError {
    KotobaError::invalid_format("arpa", format!("line {line_no}: {msg}"))
}

impl<V> BackoffModel<V>
where
    V: LoadableVocabulary,
{
    /// ARPA テキストからモデルを読み込みます。
    ///
    /// モデルの語彙に含まれるすべての単語は `decoder_vocab` にも登録され、
    /// デコーダ側のIDからモデルのIDへの対応表が作られます。
    ///
    /// # 引数
    ///
    /// * `rdr` - ARPA テキストのリーダー
    /// * `decoder_vocab` - デコーダが使用する語彙
    ///
    /// # エラー
    ///
    /// 形式が不正な場合や、`<unk>`、`<s>`、`</s>` のいずれかが欠けている場合、
    /// エラーを返します。
    pub fn from_reader<R>(rdr: R, decoder_vocab: &mut MutableVocab) -> Result<Self>
    where
        R: Read,
    {
        let mut counts: Vec<usize> = vec![];
        let mut seen: Vec<usize> = vec![];
        let mut pending_unigrams: Vec<(Box<str>, NGram)> = vec![];
        let mut vocab: Option<V> = None;
        let mut model: Option<Self> = None;
        let mut section = Section::Preamble;

        for (i, line) in BufReader::new(rdr).lines().enumerate() {
            let line_no = i + 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line == "\\data\\" {
                section = Section::Counts;
                continue;
            }
            if line == "\\end\\" {
                section = Section::End;
                break;
            }
            if let Some(n) = line
                .strip_prefix('\\')
                .and_then(|rest| rest.strip_suffix("-grams:"))
            {
                let n: usize = n.parse()?;
                if n == 0 || n > counts.len() {
                    return Err(parse_error(line_no, format!("unexpected section {line}")));
                }
                if n > 1 && model.is_none() {
                    let v = vocab.take().ok_or_else(|| {
                        parse_error(line_no, "higher order n-grams before unigrams")
                    })?;
                    let unigrams = std::mem::take(&mut pending_unigrams);
                    model = Some(Self::finish_unigrams(
                        v,
                        counts.len(),
                        unigrams,
                        decoder_vocab,
                    )?);
                }
                if n == 1 {
                    vocab = Some(V::with_capacity(counts[0]));
                }
                section = Section::NGrams(n);
                continue;
            }

            match section {
                Section::Preamble => {}
                Section::Counts => {
                    let (n, count) = line
                        .strip_prefix("ngram ")
                        .and_then(|rest| rest.split_once('='))
                        .ok_or_else(|| parse_error(line_no, format!("bad count line {line}")))?;
                    let n: usize = n.trim().parse()?;
                    if n != counts.len() + 1 {
                        return Err(parse_error(line_no, format!("unexpected order {n}")));
                    }
                    if n > MAX_ORDER {
                        return Err(KotobaError::invalid_argument(
                            "order",
                            format!("order {n} exceeds the supported maximum {MAX_ORDER}"),
                        ));
                    }
                    counts.push(count.trim().parse()?);
                    seen.push(0);
                }
                Section::NGrams(n) => {
                    let mut fields = line.split_whitespace();
                    let log_prob: f32 = fields
                        .next()
                        .ok_or_else(|| parse_error(line_no, "missing probability"))?
                        .parse()?;
                    let mut words = [""; MAX_ORDER];
                    for word in words.iter_mut().take(n) {
                        *word = fields
                            .next()
                            .ok_or_else(|| parse_error(line_no, format!("too few words: {line}")))?;
                    }
                    let backoff: f32 = match fields.next() {
                        Some(field) => field.parse()?,
                        None => 0.0,
                    };
                    if fields.next().is_some() {
                        return Err(parse_error(line_no, format!("too many fields: {line}")));
                    }
                    let ngram = NGram { log_prob, backoff };
                    seen[n - 1] += 1;

                    if n == 1 {
                        let v = vocab
                            .as_mut()
                            .ok_or_else(|| parse_error(line_no, "unigram outside of section"))?;
                        v.insert(words[0])?;
                        pending_unigrams.push((words[0].into(), ngram));
                    } else {
                        let model = model
                            .as_mut()
                            .ok_or_else(|| parse_error(line_no, "n-gram outside of section"))?;
                        let mut ids = [UNK; MAX_ORDER];
                        for (id, word) in ids.iter_mut().zip(words[..n].iter().rev()) {
                            *id = model.vocab.index(word);
                        }
                        model.higher[n - 2].insert(hash_words(&ids[..n]), ngram);
                    }
                }
                Section::End => break,
            }
        }

        if !matches!(section, Section::End) {
            return Err(KotobaError::invalid_format(
                "arpa",
                "missing \\end\\ marker",
            ));
        }
        for (n, (&expected, &actual)) in counts.iter().zip(&seen).enumerate() {
            if expected != actual {
                return Err(KotobaError::invalid_format(
                    "arpa",
                    format!(
                        "header declares {expected} {}-grams but {actual} were read",
                        n + 1
                    ),
                ));
            }
        }

        let model = match (model, vocab) {
            (Some(model), _) => model,
            (None, Some(v)) => {
                Self::finish_unigrams(v, counts.len(), pending_unigrams, decoder_vocab)?
            }
            (None, None) => {
                return Err(KotobaError::invalid_format("arpa", "no unigrams"));
            }
        };
        log::info!(
            "loaded {}-gram language model with {} words",
            model.order,
            model.unigrams.len()
        );
        Ok(model)
    }

    fn finish_unigrams(
        mut vocab: V,
        order: usize,
        unigrams: Vec<(Box<str>, NGram)>,
        decoder_vocab: &mut MutableVocab,
    ) -> Result<Self> {
        let mut enumerated: Vec<(WordIndex, String)> = Vec::with_capacity(unigrams.len() + 1);
        vocab.finished_loading(Some(&mut enumerated))?;
        check_specials(&vocab)?;

        let mut table = vec![NGram::default(); usize::from_u32(vocab.bound())];
        for (word, ngram) in unigrams {
            table[usize::from_u32(vocab.index(&word))] = ngram;
        }

        let mut to_lm = vec![UNK; usize::from_u32(decoder_vocab.bound())];
        for (lm_id, word) in enumerated {
            let id = usize::from_u32(decoder_vocab.find_or_insert(&word)?);
            if to_lm.len() <= id {
                to_lm.resize(id + 1, UNK);
            }
            to_lm[id] = lm_id;
        }

        let begin_sentence = vocab.index(BOS_WORD);
        let end_sentence = vocab.index(EOS_WORD);
        Ok(Self {
            vocab,
            order,
            unigrams: table,
            higher: (2..=order).map(|_| HashMap::new()).collect(),
            to_lm,
            begin_sentence,
            end_sentence,
        })
    }
}

impl<V> BackoffModel<V>
where
    V: Vocabulary,
{
    /// モデル自身の語彙を返します。
    pub fn vocab(&self) -> &V {
        &self.vocab
    }

    /// デコーダ側の単語IDをモデルの単語IDに変換します。
    #[inline(always)]
    pub fn lm_index(&self, word: WordIndex) -> WordIndex {
        self.to_lm
            .get(usize::from_u32(word))
            .copied()
            .unwrap_or(UNK)
    }

    fn context_backoff(&self, context: &[WordIndex]) -> f32 {
        match context.len() {
            0 => 0.0,
            1 => self.unigrams[usize::from_u32(context[0])].backoff,
            n => self
                .higher
                .get(n - 2)
                .and_then(|table| table.get(&hash_words(context)))
                .map_or(0.0, |ngram| ngram.backoff),
        }
    }

    /// モデルのIDで1語をスコアリングします。
    fn score_lm(&self, state: &LmState, word: WordIndex) -> (f32, LmState) {
        let context = state.words();
        let unigram = self
            .unigrams
            .get(usize::from_u32(word))
            .copied()
            .unwrap_or(self.unigrams[usize::from_u32(UNK)]);
        let mut log_prob = unigram.log_prob;
        let mut matched = 1;

        if word != UNK {
            let mut key = [UNK; MAX_ORDER];
            key[0] = word;
            key[1..=context.len()].copy_from_slice(context);
            for n in 2..=self.order.min(context.len() + 1) {
                match self.higher[n - 2].get(&hash_words(&key[..n])) {
                    Some(ngram) => {
                        log_prob = ngram.log_prob;
                        matched = n;
                    }
                    None => break,
                }
            }
        }

        for k in matched..=context.len() {
            log_prob += self.context_backoff(&context[..k]);
        }

        let next = if word == UNK {
            LmState::empty()
        } else {
            state.extend(word, matched.min(self.order - 1))
        };
        (log_prob, next)
    }
}

impl<V> LanguageModel for BackoffModel<V>
where
    V: Vocabulary + Send + Sync,
{
    fn order(&self) -> usize {
        self.order
    }

    fn begin_sentence_state(&self) -> LmState {
        if self.order > 1 {
            LmState::from_words(&[self.begin_sentence])
        } else {
            LmState::empty()
        }
    }

    fn score_word(&self, state: &LmState, word: WordIndex) -> (f32, LmState) {
        self.score_lm(state, self.lm_index(word))
    }

    fn score_end_sentence(&self, state: &LmState) -> f32 {
        self.score_lm(state, self.end_sentence).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::vocab::{ProbingVocabulary, SortedVocabulary};

    const ARPA: &str = include_str!("../tests/resources/bigram.arpa");

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn load<V: LoadableVocabulary + Send + Sync>() -> (BackoffModel<V>, MutableVocab) {
        let mut vocab = MutableVocab::new();
        let model = BackoffModel::<V>::from_reader(ARPA.as_bytes(), &mut vocab).unwrap();
        (model, vocab)
    }

    #[test]
    fn test_bigram_hits() {
        let (model, vocab) = load::<ProbingVocabulary>();
        let x = vocab.index("x");
        let y = vocab.index("y");

        let bos = model.begin_sentence_state();
        let (s1, state) = model.score_word(&bos, x);
        assert!(approx(s1, -0.2));
        let (s2, state) = model.score_word(&state, y);
        assert!(approx(s2, -0.3));
        assert!(approx(model.score_end_sentence(&state), -0.4));
    }

    #[test]
    fn test_backoff() {
        let (model, vocab) = load::<SortedVocabulary>();
        let x = vocab.index("x");
        let z = vocab.index("z");

        let (_, state) = model.score_word(&model.begin_sentence_state(), x);
        // p(z | x) = p(z) * bo(x)
        let (score, state) = model.score_word(&state, z);
        assert!(approx(score, -1.2 + -0.3));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_unknown_word_resets_state() {
        let (model, mut vocab) = load::<ProbingVocabulary>();
        let y = vocab.index("y");
        let oov = vocab.find_or_insert("Gartenzwerg").unwrap();

        let (_, state) = model.score_word(&model.null_context_state(), y);
        let (score, state) = model.score_word(&state, oov);
        assert!(approx(score, -1.0 + -0.2));
        assert!(state.is_empty());
    }

    #[test]
    fn test_split_equals_full() {
        let (model, vocab) = load::<SortedVocabulary>();
        let words = ["x", "y", "z", "x"].map(|w| vocab.index(w));
        let bos = model.begin_sentence_state();

        let (full, full_state) = model.score_words(&bos, &words);
        let (left, mid) = model.score_words(&bos, &words[..2]);
        let (right, split_state) = model.score_words(&mid, &words[2..]);
        assert!(approx(full, left + right));
        assert_eq!(full_state, split_state);
    }

    #[test]
    fn test_vocab_kinds_agree() {
        let (sorted, sorted_vocab) = load::<SortedVocabulary>();
        let (probing, probing_vocab) = load::<ProbingVocabulary>();
        for sentence in [["x", "y"], ["y", "z"], ["z", "q"]] {
            let a = sentence.map(|w| sorted_vocab.index(w));
            let b = sentence.map(|w| probing_vocab.index(w));
            let (sa, _) = sorted.score_words(&sorted.begin_sentence_state(), &a);
            let (sb, _) = probing.score_words(&probing.begin_sentence_state(), &b);
            assert!(approx(sa, sb));
        }
    }

    #[test]
    fn test_decoder_vocab_contains_lm_words() {
        let (model, vocab) = load::<SortedVocabulary>();
        for word in ["<s>", "</s>", "x", "y", "z"] {
            let id = vocab.index(word);
            assert_ne!(id, UNK);
            assert_eq!(model.lm_index(id), model.vocab().index(word));
        }
    }

    #[test]
    fn test_missing_unk() {
        let arpa = "\\data\\\nngram 1=2\n\n\\1-grams:\n-1.0\t<s>\n-1.0\t</s>\n\n\\end\\\n";
        let mut vocab = MutableVocab::new();
        let result = BackoffModel::<ProbingVocabulary>::from_reader(arpa.as_bytes(), &mut vocab);
        assert!(matches!(
            result,
            Err(KotobaError::MissingSpecialWord { word: "<unk>" })
        ));
    }

    #[test]
    fn test_count_mismatch() {
        let arpa = "\\data\\\nngram 1=4\n\n\\1-grams:\n\
                    -1.0\t<unk>\n-1.0\t<s>\n-1.0\t</s>\n\n\\end\\\n";
        let mut vocab = MutableVocab::new();
        let result = BackoffModel::<SortedVocabulary>::from_reader(arpa.as_bytes(), &mut vocab);
        assert!(matches!(result, Err(KotobaError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_end() {
        let arpa = "\\data\\\nngram 1=3\n\n\\1-grams:\n-1.0\t<unk>\n-1.0\t<s>\n-1.0\t</s>\n";
        let mut vocab = MutableVocab::new();
        let result = BackoffModel::<SortedVocabulary>::from_reader(arpa.as_bytes(), &mut vocab);
        assert!(result.is_err());
    }
}
