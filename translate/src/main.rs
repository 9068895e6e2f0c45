//! 翻訳を実行するユーティリティ
//!
//! このバイナリは、標準入力から1行1文で読み込んだテキストを翻訳し、
//! 結果を標準出力に出力します。

use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use kotoba::lm::BackoffModel;
use kotoba::scorer::{
    LanguageModelFeature, Passthrough, PhrasePenalty, TableScores, WordPenalty,
};
use kotoba::vocab::{LoadableVocabulary, MutableVocab, ProbingVocabulary, SortedVocabulary};
use kotoba::{Decoder, Objective, PhraseTableBuilder, Weights};

use clap::Parser;

/// 言語モデルの語彙の種類
#[derive(Clone, Copy, Debug)]
enum VocabKind {
    Sorted,
    Probing,
}

impl FromStr for VocabKind {
    type Err = &'static str;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind {
            "sorted" => Ok(Self::Sorted),
            "probing" => Ok(Self::Probing),
            _ => Err("Could not parse a vocabulary kind"),
        }
    }
}

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "translate", about = "Translates sentences with a phrase table")]
struct Args {
    /// Phrase table in the `source ||| target ||| scores` format.
    #[clap(short = 'p', long)]
    phrase_table: PathBuf,

    /// Language model in the ARPA format.
    #[clap(short = 'l', long)]
    lm: Option<PathBuf>,

    /// Feature weights as `name=value` pairs.
    #[clap(short = 'w', long)]
    weights: Option<PathBuf>,

    /// Number of scores in each phrase table line.
    #[clap(long, default_value = "1")]
    table_scores: usize,

    /// Maximum number of hypotheses popped per vertex.
    #[clap(long, default_value = "1000")]
    pop_limit: usize,

    /// Maximum number of target phrases kept per source phrase.
    #[clap(long)]
    table_limit: Option<usize>,

    /// Number of translations printed per sentence.
    #[clap(short = 'n', long, default_value = "1")]
    nbest: usize,

    /// Vocabulary of the language model. Choices are sorted and probing.
    #[clap(long, default_value = "probing")]
    vocab_kind: VocabKind,

    /// Prints the feature values of each translation.
    #[clap(short = 'D', long)]
    detail: bool,
}

fn add_language_model<V>(
    objective: &mut Objective,
    vocab: &mut MutableVocab,
    path: &Path,
) -> Result<(), Box<dyn Error>>
where
    V: LoadableVocabulary + Send + Sync + 'static,
{
    let model = BackoffModel::<V>::from_reader(File::open(path)?, vocab)?;
    objective.add_feature(LanguageModelFeature::new(model));
    Ok(())
}

/// 重みファイルがない場合の既定の重み
fn default_weights(table_scores: usize) -> Weights {
    let mut weights = Weights::new();
    for i in 0..table_scores {
        weights.insert(&format!("phrase_table_{i}"), 1.0);
    }
    weights.insert("lm", 1.0);
    weights.insert("passthrough", -100.0);
    weights
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut vocab = MutableVocab::new();
    let mut objective = Objective::new();
    if let Some(lm) = &args.lm {
        eprintln!("Loading the language model...");
        match args.vocab_kind {
            VocabKind::Sorted => {
                add_language_model::<SortedVocabulary>(&mut objective, &mut vocab, lm)?
            }
            VocabKind::Probing => {
                add_language_model::<ProbingVocabulary>(&mut objective, &mut vocab, lm)?
            }
        }
    }
    objective.add_feature(TableScores::new(args.table_scores));
    objective.add_feature(Passthrough);
    objective.add_feature(WordPenalty);
    objective.add_feature(PhrasePenalty);

    let weights = match &args.weights {
        Some(path) => Weights::from_path(path)?,
        None => default_weights(args.table_scores),
    };
    objective.load_weights(&weights);

    eprintln!("Loading the phrase table...");
    let mut builder = PhraseTableBuilder::new();
    if let Some(limit) = args.table_limit {
        builder = builder.table_limit(limit);
    }
    let table = builder.from_path(&args.phrase_table, &mut vocab, &objective)?;

    let descriptions = objective.feature_descriptions();
    let decoder = Decoder::new(vocab, table, objective)
        .pop_limit(args.pop_limit)?
        .nbest(args.nbest)?
        .detail(args.detail);
    let mut worker = decoder.new_worker();

    eprintln!("Ready to translate");

    let is_tty = atty::is(atty::Stream::Stdout);

    let out = std::io::stdout();
    let mut out = BufWriter::new(out.lock());
    let lines = std::io::stdin().lock().lines();
    for (sentence_id, line) in lines.enumerate() {
        let line = line?;
        worker.reset_sentence(line);
        worker.decode()?;
        for translation in worker.translations() {
            if args.nbest > 1 || args.detail {
                write!(
                    &mut out,
                    "{sentence_id} ||| {} ||| {}",
                    translation.text(),
                    translation.score()
                )?;
                if let Some(features) = translation.features() {
                    out.write_all(b" |||")?;
                    for (name, value) in descriptions.iter().zip(features.dense()) {
                        write!(&mut out, " {name}={value}")?;
                    }
                    for (name, value) in features.sparse() {
                        write!(&mut out, " {name}={value}")?;
                    }
                }
                out.write_all(b"\n")?;
            } else {
                out.write_all(translation.text().as_bytes())?;
                out.write_all(b"\n")?;
            }
        }
        if is_tty {
            out.flush()?;
        }
    }

    Ok(())
}
