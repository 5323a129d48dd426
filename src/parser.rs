//! トークナイザ + コマンド解決: 入力行を引数ベクタに分割し、[`Command`] に変換する。
//!
//! 空白の連続で区切るだけで、クォート・エスケープ・変数展開・glob は扱わない。
//! トークンは入力行を借用する（ゼロコピー）。
//!
//! ## コマンドの種類
//!
//! | 先頭トークン | [`Command`] |
//! |-------------|-------------|
//! | `exit` | [`Command::Exit`] |
//! | `history` | [`Command::History`] |
//! | `cd` | [`Command::ChangeDir`] |
//! | それ以外 | [`Command::External`] |

/// ビルトインの種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    History,
    Cd,
}

/// 解決済みのコマンド。executor はこれを 1 つの `match` で処理する。
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// `exit` — セッションを終了する。
    Exit,
    /// `history` — 履歴を古い順に表示する。
    History,
    /// `cd [dir]` — `None` なら `$HOME`。
    ChangeDir(Option<&'a str>),
    /// 外部コマンド。`args[0]` がコマンド名。
    External(Vec<&'a str>),
}

/// 空白の連続で分割する。空トークンは生じない。
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// 先頭トークンをビルトインに解決する。該当しなければ `None`。
pub fn resolve_builtin(name: &str) -> Option<Builtin> {
    match name {
        "exit" => Some(Builtin::Exit),
        "history" => Some(Builtin::History),
        "cd" => Some(Builtin::Cd),
        _ => None,
    }
}

impl<'a> Command<'a> {
    /// 引数ベクタから [`Command`] を作る。空なら `None`。
    pub fn from_args(args: Vec<&'a str>) -> Option<Self> {
        let first = *args.first()?;
        let cmd = match resolve_builtin(first) {
            Some(Builtin::Exit) => Command::Exit,
            Some(Builtin::History) => Command::History,
            Some(Builtin::Cd) => Command::ChangeDir(args.get(1).copied()),
            None => Command::External(args),
        };
        Some(cmd)
    }

    /// 行を分割して [`Command`] にする。空白のみなら `None`。
    pub fn parse(line: &'a str) -> Option<Self> {
        Self::from_args(tokenize(line))
    }
}
