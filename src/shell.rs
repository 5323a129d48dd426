//! シェルセッションの状態を保持するモジュール。
//!
//! [`Shell`] が履歴（[`History`]）とターミナルモード（[`Terminal`]）を所有し、
//! 行エディタと executor には参照で渡す。グローバル変数は使わない。
//! セッションの終了は [`Shell::finish`] で、履歴を解放しターミナルを復元する。

use crate::editor::{LineEditor, ReadOutcome};
use crate::error::ShellError;
use crate::executor;
use crate::history::History;
use crate::terminal::{ModeBackend, Termios, Terminal};

use std::io::{Read, Write};

/// シェルの実行状態。REPL ループ全体で共有される。
pub struct Shell<B: ModeBackend = Termios> {
    /// セッション中に入力されたコマンド履歴。
    pub history: History,
    /// 制御端末のモード。1 行読み取る間だけ raw になる。
    pub terminal: Terminal<B>,
    /// 直前のコマンドの終了ステータス。EOF 時の終了コードに使う。
    pub last_status: i32,
    /// `exit` ビルトインで true にセットされ、REPL ループを終了させる。
    pub should_exit: bool,
}

impl Shell<Termios> {
    /// 標準入力を制御端末とするセッション。
    pub fn new() -> Self {
        Self::with_terminal(Terminal::new(Termios::stdin()))
    }
}

impl Default for Shell<Termios> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ModeBackend> Shell<B> {
    pub fn with_terminal(terminal: Terminal<B>) -> Self {
        Self {
            history: History::new(),
            terminal,
            last_status: 0,
            should_exit: false,
        }
    }

    /// エディタで 1 行読み取る。raw モードは読み取りの間だけ有効。
    pub fn read_line<R: Read, W: Write>(
        &mut self,
        editor: &mut LineEditor<R, W>,
    ) -> Result<ReadOutcome, ShellError> {
        editor.read_line(&mut self.terminal, &self.history)
    }

    /// 確定した行を履歴に追加して実行する。
    ///
    /// 空白のみの行は履歴にも実行にも回さず `None` を返す。
    pub fn submit(&mut self, line: &str) -> Option<i32> {
        if line.trim().is_empty() {
            return None;
        }
        self.history.append(line);
        let status = executor::execute(self, line);
        self.last_status = status;
        Some(status)
    }

    /// REPL の 1 周分: 1 行読み取り、確定していれば実行する。
    ///
    /// ループを続けるなら `true`。EOF または `exit` で `false`。
    /// Ctrl+C で破棄された行は履歴にも実行にも回さない。
    pub fn step<R: Read, W: Write>(
        &mut self,
        editor: &mut LineEditor<R, W>,
    ) -> Result<bool, ShellError> {
        match self.read_line(editor)? {
            ReadOutcome::Submitted(line) => {
                self.submit(&line);
                Ok(!self.should_exit)
            }
            ReadOutcome::Cancelled => Ok(true),
            ReadOutcome::Eof => Ok(false),
        }
    }

    /// セッションを終了する。ターミナルを復元し、履歴を解放して終了コードを返す。
    ///
    /// 復元に失敗した場合は直前のステータスに関わらず 1。
    pub fn finish(mut self) -> i32 {
        let restored = match self.terminal.restore_mode() {
            Ok(()) => true,
            Err(e) => {
                eprintln!("{}", e);
                false
            }
        };
        tracing::debug!(entries = self.history.len(), restored, "shell: session finished");
        if restored {
            self.last_status
        } else {
            1
        }
    }
}

/// シグナル設定: シェル自体は SIGINT/SIGTSTP を無視する。
///
/// 行編集中は raw モード（`ISIG` OFF）なので Ctrl+C/Z はキー入力として届く。
/// 子プロセスの実行中は端末が cooked に戻り、シグナルはシェルと子の両方に届くが、
/// シェルは無視し、子は spawn 時に `SIG_DFL` に戻されているため子だけが止まる。
pub fn install_signal_policy() {
    for sig in crate::spawn::RESET_SIGNALS {
        let prev = unsafe { libc::signal(sig, libc::SIG_IGN) };
        if prev == libc::SIG_ERR {
            tracing::warn!(sig, "shell: failed to ignore signal");
        }
    }
}
