//! ビルトインコマンドの実装。
//!
//! ビルトインは spawn を経由せずプロセス内で直接実行される。
//! どのビルトインを呼ぶかは [`executor::dispatch`](crate::executor::dispatch) の
//! `match` が決める。

use std::env;
use std::io::{self, Write};
use std::path::Path;

use crate::error::ShellError;
use crate::history::History;
use crate::shell::Shell;
use crate::terminal::ModeBackend;

/// `exit` — REPL ループを終了させる。終了コードは常に 0。
///
/// 履歴の解放とターミナルの復元は [`Shell::finish`] が行う。
pub fn exit<B: ModeBackend>(shell: &mut Shell<B>) -> i32 {
    shell.should_exit = true;
    0
}

/// `history` — 履歴を古い順に 1 行ずつ出力する。履歴が空なら空行を 1 つ出す。
pub fn history<W: Write>(history: &History, out: &mut W) -> io::Result<()> {
    if history.is_empty() {
        writeln!(out)?;
    }
    for entry in history.iter() {
        writeln!(out, "{}", entry)?;
    }
    out.flush()
}

/// `cd [dir]` — カレントディレクトリを変更する。引数省略時は `$HOME` に移動。
/// 失敗してもカレントディレクトリは変わらない。
pub fn cd(target: Option<&str>) -> Result<(), ShellError> {
    let target = match target {
        Some(dir) => dir.to_string(),
        None => env::var("HOME").map_err(|_| ShellError::HomeNotSet)?,
    };

    env::set_current_dir(Path::new(&target)).map_err(|source| ShellError::ChangeDir {
        path: target.clone(),
        source,
    })?;
    tracing::debug!(dir = %target, "cd: changed directory");
    Ok(())
}
