//! エラー型の定義
//!
//! このモジュールは、Kotobaライブラリで使用されるすべてのエラー型を定義します。

use std::error::Error;
use std::fmt::{self, Debug};

/// Kotoba専用のResult型
///
/// エラー型としてデフォルトで[`KotobaError`]を使用します。
pub type Result<T, E = KotobaError> = std::result::Result<T, E>;

/// Kotobaのエラー型
///
/// このライブラリで発生する可能性のあるすべてのエラーを表現します。
/// フレーズテーブルの不正な入力や、事前に計算された容量の超過など、
/// 構築時の致命的なエラーはすべてこの型で報告されます。
#[derive(Debug, thiserror::Error)]
pub enum KotobaError {
    /// 無効な引数エラー
    ///
    /// [`InvalidArgumentError`]のエラーバリアント。
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// 無効なフォーマットエラー
    ///
    /// [`InvalidFormatError`]のエラーバリアント。
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// 無効な状態エラー
    ///
    /// [`InvalidStateError`]のエラーバリアント。
    #[error(transparent)]
    InvalidState(InvalidStateError),

    /// 同じ原言語フレーズが連続しない位置に再出現した
    ///
    /// フレーズテーブルは原言語フレーズでグループ化（ソート）されている必要があります。
    #[error(
        "Source phrase {phrase:?} appears non-consecutively in the phrase table (line {line})."
    )]
    NonConsecutiveSource {
        /// 原言語フレーズのテキスト
        phrase: String,
        /// 再出現した行番号（1始まり）
        line: usize,
    },

    /// 読み込み完了後に必須の特殊語が語彙に存在しない
    #[error("The vocabulary is missing the special word {word}.")]
    MissingSpecialWord {
        /// 欠けている特殊語（`<unk>`、`<s>`、`</s>`）
        word: &'static str,
    },

    /// 固定アロケータの容量超過
    ///
    /// 容量はグラフ構築前に正確に計算されるため、このエラーは内部の整合性違反を示します。
    #[error("Allocating past end: {what} was sized for {capacity} elements.")]
    CapacityExceeded {
        /// 確保対象の名前
        what: &'static str,
        /// 確保済みの容量
        capacity: usize,
    },

    /// 整数変換エラー
    ///
    /// [`TryFromIntError`](std::num::TryFromIntError)のエラーバリアント。
    #[error(transparent)]
    TryFromInt(std::num::TryFromIntError),

    /// 浮動小数点数パースエラー
    ///
    /// [`ParseFloatError`](std::num::ParseFloatError)のエラーバリアント。
    #[error(transparent)]
    ParseFloat(std::num::ParseFloatError),

    /// 整数パースエラー
    ///
    /// [`ParseIntError`](std::num::ParseIntError)のエラーバリアント。
    #[error(transparent)]
    ParseInt(std::num::ParseIntError),

    /// I/Oエラー
    ///
    /// [`std::io::Error`](std::io::Error)のエラーバリアント。
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl KotobaError {
    /// 無効な引数エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 引数の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効なフォーマットエラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - フォーマット名
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効な状態エラーを生成します
    ///
    /// # 引数
    ///
    /// * `msg` - エラーメッセージ
    /// * `cause` - エラーの原因
    pub(crate) fn invalid_state<S, M>(msg: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::InvalidState(InvalidStateError {
            msg: msg.into(),
            cause: cause.into(),
        })
    }
}

/// 引数が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// 引数の名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// 入力フォーマットが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidFormatError {
    /// フォーマットの名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl InvalidFormatError {
    /// エラーメッセージを返します。
    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidFormatError {}

/// 状態が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidStateError {
    /// エラーメッセージ
    pub(crate) msg: String,

    /// エラーの根本原因
    pub(crate) cause: String,
}

impl fmt::Display for InvalidStateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidStateError: {}: {}", self.msg, self.cause)
    }
}

impl Error for InvalidStateError {}

impl From<std::num::TryFromIntError> for KotobaError {
    fn from(error: std::num::TryFromIntError) -> Self {
        Self::TryFromInt(error)
    }
}

impl From<std::num::ParseFloatError> for KotobaError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::ParseFloat(error)
    }
}

impl From<std::num::ParseIntError> for KotobaError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::ParseInt(error)
    }
}
