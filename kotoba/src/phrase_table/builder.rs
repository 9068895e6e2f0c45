use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use hashbrown::hash_map::Entry as MapEntry;

use crate::errors::{KotobaError, Result};
use crate::lm::LmState;
use crate::phrase_table::{Entry, PhraseTable, ScoreSpan};
use crate::scorer::{Objective, TargetPhraseInfo, TargetPhraseType};
use crate::search::{History, Hypothesis, TieBreak, Vertex};
use crate::utils::{FromU32, hash_bytes, hash_words, split_fields};
use crate::vocab::{MutableVocab, WordIndex};

/// フレーズテーブルのビルダー
///
/// # 例
///
/// ```
/// use kotoba::phrase_table::PhraseTableBuilder;
/// use kotoba::scorer::Objective;
/// use kotoba::vocab::MutableVocab;
///
/// let mut vocab = MutableVocab::new();
/// let objective = Objective::new();
/// let table = PhraseTableBuilder::new()
///     .table_limit(20)
///     .from_reader("das Haus ||| the house ||| -1.0".as_bytes(), &mut vocab, &objective)?;
/// assert_eq!(table.len(), 1);
/// # Ok::<(), kotoba::errors::KotobaError>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct PhraseTableBuilder {
    table_limit: Option<usize>,
    tie_break: TieBreak,
}

impl PhraseTableBuilder {
    /// 既定の設定でビルダーを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 各エントリに残す訳候補の最大数を設定します。
    pub fn table_limit(mut self, limit: usize) -> Self {
        self.table_limit = Some(limit);
        self
    }

    /// 同点の訳候補の順序を設定します。
    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    fn finish(&self, vertex: &mut Vertex) {
        vertex.finish_root(self.tie_break, self.table_limit);
    }

    /// ファイルからフレーズテーブルを読み込みます。
    pub fn from_path<P>(
        self,
        path: P,
        vocab: &mut MutableVocab,
        objective: &Objective,
    ) -> Result<PhraseTable>
    where
        P: AsRef<Path>,
    {
        self.from_reader(File::open(path)?, vocab, objective)
    }

    /// リーダーからフレーズテーブルを読み込みます。
    ///
    /// # エラー
    ///
    /// 次の場合にエラーを返します。
    ///
    /// - UTF-8として不正な行がある
    /// - フィールドが3つでない行がある
    /// - スコア欄が数値として解釈できない、または値の数が目的関数の要求と合わない
    /// - 同じ原言語フレーズが連続しない位置に再び現れる
    pub fn from_reader<R>(
        self,
        rdr: R,
        vocab: &mut MutableVocab,
        objective: &Objective,
    ) -> Result<PhraseTable>
    where
        R: Read,
    {
        let mut table = PhraseTable::default();
        let expected_scores = objective.table_score_count();

        let mut previous_text_hash = None;
        let mut current: Option<usize> = None;
        let mut source: Vec<WordIndex> = vec![];
        let mut scores: Vec<f32> = vec![];

        let mut rdr = BufReader::new(rdr);
        let mut buf = vec![];
        let mut line_no = 0;
        loop {
            buf.clear();
            if rdr.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;
            let line = std::str::from_utf8(&buf).map_err(|e| {
                KotobaError::invalid_format("phrase table", format!("line {line_no}: {e}"))
            })?;
            let line = line.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = split_fields(line);
            let source_text = fields.next().unwrap_or_default();
            let (Some(target_text), Some(score_text)) = (fields.next(), fields.next()) else {
                return Err(KotobaError::invalid_format(
                    "phrase table",
                    format!("line {line_no}: missing fields: {line}"),
                ));
            };
            if let Some(extra) = fields.next() {
                return Err(KotobaError::invalid_format(
                    "phrase table",
                    format!("line {line_no}: Extra fields in phrase table: {extra}"),
                ));
            }

            let text_hash = hash_bytes(source_text.as_bytes());
            if previous_text_hash != Some(text_hash) {
                source.clear();
                for word in source_text.split_whitespace() {
                    source.push(vocab.find_or_insert(word)?);
                }
                if source.is_empty() {
                    return Err(KotobaError::invalid_format(
                        "phrase table",
                        format!("line {line_no}: empty source phrase"),
                    ));
                }
                previous_text_hash = Some(text_hash);

                // Same words spelled with different spacing continue the current entry.
                let continues = current.is_some_and(|idx| *table.entries[idx].source == *source);
                if !continues {
                    if let Some(idx) = current {
                        self.finish(&mut table.entries[idx].vertex);
                    }
                    let idx = table.entries.len();
                    match table.index.entry(hash_words(&source)) {
                        MapEntry::Occupied(e) => {
                            let existing = &table.entries[usize::from_u32(*e.get())];
                            if *existing.source != *source {
                                return Err(KotobaError::invalid_state(
                                    "source phrase hash collision",
                                    format!("line {line_no}: {source_text}"),
                                ));
                            }
                            return Err(KotobaError::NonConsecutiveSource {
                                phrase: source_text.to_string(),
                                line: line_no,
                            });
                        }
                        MapEntry::Vacant(e) => {
                            e.insert(u32::try_from(idx)?);
                        }
                    }
                    let mut vertex = Vertex::new();
                    vertex.init_root();
                    table.entries.push(Entry {
                        source: source.as_slice().into(),
                        vertex,
                    });
                    table.max_source_phrase_length =
                        table.max_source_phrase_length.max(source.len());
                    current = Some(idx);
                }
            }

            let phrase = table.pool.allocate();
            for word in target_text.split_whitespace() {
                table.pool.continue_with(phrase, vocab.find_or_insert(word)?);
            }

            scores.clear();
            for token in score_text.split_whitespace() {
                let value: f32 = token.parse().map_err(|_| {
                    KotobaError::invalid_format(
                        "phrase table",
                        format!("line {line_no}: bad score {token:?}"),
                    )
                })?;
                scores.push(value);
            }
            if expected_scores != 0 && scores.len() != expected_scores {
                return Err(KotobaError::invalid_format(
                    "phrase table",
                    format!(
                        "line {line_no}: expected {expected_scores} scores, got {}",
                        scores.len()
                    ),
                ));
            }
            let span = ScoreSpan {
                offset: u32::try_from(table.scores.len())?,
                len: u32::try_from(scores.len())?,
            };
            table.scores.extend_from_slice(&scores);

            let score = objective.score_phrase(
                TargetPhraseInfo {
                    words: table.pool.words(phrase),
                    kind: TargetPhraseType::Table,
                    scores: &scores,
                },
                None,
            );
            let Some(idx) = current else {
                return Err(KotobaError::invalid_state(
                    "no open phrase table entry",
                    format!("line {line_no}"),
                ));
            };
            table.entries[idx].vertex.append_hypothesis(Hypothesis::new(
                score,
                LmState::empty(),
                History::Phrase {
                    phrase,
                    scores: span,
                },
            ));
        }

        if let Some(idx) = current {
            self.finish(&mut table.entries[idx].vertex);
        }
        log::info!(
            "loaded phrase table: {} source phrases, {} target words",
            table.len(),
            table.pool.used()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use crate::scorer::TableScores;

    fn objective() -> Objective {
        let mut objective = Objective::new();
        objective.add_feature(TableScores::new(1));
        objective.set_weight(0, 1.0).unwrap();
        objective
    }

    #[test]
    fn test_table_limit() {
        let text = "a ||| x ||| -3\na ||| y ||| -1\na ||| z ||| -2\n";
        let mut vocab = MutableVocab::new();
        let table = PhraseTableBuilder::new()
            .table_limit(2)
            .from_reader(text.as_bytes(), &mut vocab, &objective())
            .unwrap();
        let entry = table.phrases(&[vocab.index("a")]).unwrap();
        let scores: Vec<_> = entry.vertex().hypotheses().iter().map(|h| h.score()).collect();
        assert_eq!(scores, vec![-1.0, -2.0]);
    }

    #[test]
    fn test_blank_lines_and_spacing() {
        let text = "\na  b ||| x ||| -1\n\na b ||| y ||| -2\n";
        let mut vocab = MutableVocab::new();
        let table = PhraseTableBuilder::new()
            .from_reader(text.as_bytes(), &mut vocab, &objective())
            .unwrap();
        assert_eq!(table.len(), 1);
        let entry = table
            .phrases(&[vocab.index("a"), vocab.index("b")])
            .unwrap();
        assert_eq!(entry.vertex().len(), 2);
    }

    #[test]
    fn test_no_score_feature_accepts_any_width() {
        let text = "a ||| x ||| 0 1 2\nb ||| y |||\n";
        let mut vocab = MutableVocab::new();
        let table = PhraseTableBuilder::new()
            .from_reader(text.as_bytes(), &mut vocab, &Objective::new())
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_bad_score() {
        let text = "a ||| x ||| abc\n";
        let mut vocab = MutableVocab::new();
        let result =
            PhraseTableBuilder::new().from_reader(text.as_bytes(), &mut vocab, &objective());
        match result {
            Err(KotobaError::InvalidFormat(e)) => assert!(e.message().starts_with("line 1:")),
            _ => panic!("expected a format error"),
        }
    }

    #[test]
    fn test_invalid_utf8_reports_line() {
        let mut bytes = b"a ||| x ||| -1\r\n".to_vec();
        bytes.extend_from_slice(b"b ||| \xff\xfe ||| -1\n");
        let mut vocab = MutableVocab::new();
        let result = PhraseTableBuilder::new().from_reader(&bytes[..], &mut vocab, &objective());
        match result {
            Err(KotobaError::InvalidFormat(e)) => assert!(e.message().starts_with("line 2:")),
            _ => panic!("expected a format error"),
        }
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a b ||| x y ||| -1.0").unwrap();
        writeln!(file, "c ||| z ||| -0.5").unwrap();
        file.flush().unwrap();

        let mut vocab = MutableVocab::new();
        let table = PhraseTableBuilder::new()
            .from_path(file.path(), &mut vocab, &objective())
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.max_source_phrase_length(), 2);
    }

    #[test]
    fn test_missing_file() {
        let mut vocab = MutableVocab::new();
        let result = PhraseTableBuilder::new().from_path(
            "/nonexistent/phrase-table",
            &mut vocab,
            &objective(),
        );
        assert!(matches!(result, Err(KotobaError::IoError(_))));
    }
}
