use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::errors::{KotobaError, Result};

/// 素性の重み
///
/// `名前=値` の組を空白または改行で区切って記述します。
/// `#` から行末まではコメントとして無視されます。
///
/// ```text
/// lm=0.5 word_penalty=-1
/// # table scores
/// phrase_table_0=0.2
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Weights {
    entries: Vec<(String, f32)>,
}

impl Weights {
    /// 空の重みを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// リーダーから重みを読み込みます。
    ///
    /// # エラー
    ///
    /// `名前=値` の形式でない語や、数値として解釈できない値がある場合、
    /// エラーを返します。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut weights = Self::new();
        for (i, line) in BufReader::new(rdr).lines().enumerate() {
            let line = line?;
            let line = line.split('#').next().unwrap_or_default();
            for token in line.split_whitespace() {
                let (name, value) = token.split_once('=').ok_or_else(|| {
                    KotobaError::invalid_format(
                        "weights",
                        format!("line {}: expected name=value, got {token:?}", i + 1),
                    )
                })?;
                let value: f32 = value.parse().map_err(|_| {
                    KotobaError::invalid_format(
                        "weights",
                        format!("line {}: bad weight value in {token:?}", i + 1),
                    )
                })?;
                weights.insert(name, value);
            }
        }
        Ok(weights)
    }

    /// ファイルから重みを読み込みます。
    pub fn from_path<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Self::from_reader(std::fs::File::open(path)?)
    }

    /// 重みを設定します。同じ名前の重みは上書きされます。
    pub fn insert(&mut self, name: &str, value: f32) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// 名前に対応する重みを返します。
    pub fn get(&self, name: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, v)| v)
    }

    /// 記述順に重みを列挙します。
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// 重みの数を返します。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 重みが1つもない場合に `true` を返します。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
