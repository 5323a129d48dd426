//! コマンド実行: ビルトイン判定と外部コマンドのライフサイクル管理。
//!
//! - [`execute`]: 1 行を [`Command`] に解決して [`dispatch`] に渡す
//! - [`dispatch`]: ビルトインはプロセス内で実行、それ以外は [`run_external`]
//! - [`run_external`]: `posix_spawnp` で起動し（SIGINT/SIGTSTP は子で `SIG_DFL`）、
//!   `waitpid(WUNTRACED)` で終了・シグナル終了・停止のいずれかまで待機
//!
//! 回復可能なエラー（`cd` 失敗、コマンドが見つからない、プロセス生成失敗）は
//! ここで診断を出して終了ステータスに変換し、REPL ループには伝播させない。

use std::io;

use crate::builtins;
use crate::error::ShellError;
use crate::parser::Command;
use crate::shell::Shell;
use crate::spawn;
use crate::terminal::ModeBackend;

/// 待機が終わったときの子プロセスの状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildState {
    /// 正常終了（終了コード）。
    Exited(i32),
    /// シグナルで終了（シグナル番号）。
    Signaled(i32),
    /// シグナルで停止（シグナル番号）。シェルは待機をやめて次のプロンプトに戻る。
    Stopped(i32),
}

impl ChildState {
    /// シェル流の終了ステータス。シグナル終了・停止は 128 + シグナル番号。
    pub fn status(&self) -> i32 {
        match *self {
            ChildState::Exited(code) => code,
            ChildState::Signaled(sig) | ChildState::Stopped(sig) => 128 + sig,
        }
    }

    /// `waitpid` の raw status を解釈する。終了・シグナル終了・停止以外なら `None`。
    fn from_raw(raw_status: i32) -> Option<Self> {
        if libc::WIFEXITED(raw_status) {
            Some(ChildState::Exited(libc::WEXITSTATUS(raw_status)))
        } else if libc::WIFSIGNALED(raw_status) {
            Some(ChildState::Signaled(libc::WTERMSIG(raw_status)))
        } else if libc::WIFSTOPPED(raw_status) {
            Some(ChildState::Stopped(libc::WSTOPSIG(raw_status)))
        } else {
            None
        }
    }
}

/// `pid` が終了・シグナル終了・停止するまでブロックする。
///
/// `waitpid(pid, WUNTRACED)` をループし、`EINTR` なら待ち直す。
pub fn wait_for(pid: libc::pid_t) -> io::Result<ChildState> {
    loop {
        let mut raw_status: i32 = 0;
        let ret = unsafe { libc::waitpid(pid, &mut raw_status, libc::WUNTRACED) };
        if ret < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if let Some(state) = ChildState::from_raw(raw_status) {
            return Ok(state);
        }
    }
}

/// 外部コマンドを起動し、終了・シグナル終了・停止まで待機する。
pub fn run_external(args: &[&str]) -> Result<ChildState, ShellError> {
    let pid = spawn::spawn(args)?;
    let state = wait_for(pid)?;
    tracing::debug!(pid, ?state, "executor: child finished waiting");
    if let ChildState::Stopped(sig) = state {
        tracing::warn!(pid, sig, "executor: child stopped; returning to prompt");
    }
    Ok(state)
}

/// 解決済みのコマンドを実行し、終了ステータスを返す。
pub fn dispatch<B: ModeBackend>(shell: &mut Shell<B>, cmd: Command<'_>) -> i32 {
    tracing::debug!(?cmd, "executor: dispatch");
    match cmd {
        Command::Exit => builtins::exit(shell),
        Command::History => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            match builtins::history(&shell.history, &mut out) {
                Ok(()) => 0,
                Err(e) => report(&ShellError::Io(e)),
            }
        }
        Command::ChangeDir(target) => match builtins::cd(target) {
            Ok(()) => 0,
            Err(e) => report(&e),
        },
        Command::External(args) => match run_external(&args) {
            Ok(state) => state.status(),
            Err(e) => report(&e),
        },
    }
}

/// 1 行を解決して実行する。空白のみの行は何もせず直前のステータスを返す。
pub fn execute<B: ModeBackend>(shell: &mut Shell<B>, line: &str) -> i32 {
    match Command::parse(line) {
        Some(cmd) => dispatch(shell, cmd),
        None => shell.last_status,
    }
}

/// 診断を stderr に出し、対応する終了ステータスを返す。
fn report(e: &ShellError) -> i32 {
    eprintln!("{}", e);
    e.exit_status()
}
