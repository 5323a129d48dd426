//! シェル全体のエラー型。
//!
//! - 致命的: [`ShellError::Terminal`]（termios の取得・設定失敗）。`main` まで伝播させて終了する。
//! - 回復可能: それ以外。発生箇所で `flash: ...` 形式の診断を出し、REPL ループは継続する。
//!   ただし行の読み取り中の [`ShellError::Io`] は入力の終端と同じくセッションを終える。
//!
//! 子プロセスの終了・シグナル・停止、および Ctrl+C による入力キャンセルはエラーではない。

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    /// `tcgetattr` / `tcsetattr` の失敗。ターミナルを安全に扱えないため続行不可。
    #[error("flash: {op}: {source}")]
    Terminal {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// `posix_spawnp` の失敗。`errno` はコマンド名とともに保持する。
    #[error("flash: {command}: {}", spawn_reason(.errno))]
    Spawn { command: String, errno: i32 },

    /// `cd` の移動先が存在しない、権限がない等。
    #[error("flash: cd: {path}: {source}")]
    ChangeDir {
        path: String,
        #[source]
        source: io::Error,
    },

    /// 引数なしの `cd` で `$HOME` が未設定。
    #[error("flash: cd: HOME not set")]
    HomeNotSet,

    /// 端末入出力の失敗。
    #[error("flash: {0}")]
    Io(#[from] io::Error),
}

fn spawn_reason(errno: &i32) -> String {
    match *errno {
        libc::ENOENT => "command not found".to_string(),
        libc::EACCES => "permission denied".to_string(),
        _ => io::Error::from_raw_os_error(*errno).to_string(),
    }
}

impl ShellError {
    /// エラーに対応する終了ステータスを返す。
    /// 127 = command not found, 126 = permission denied, 1 = その他。
    pub fn exit_status(&self) -> i32 {
        match self {
            ShellError::Spawn { errno, .. } => match *errno {
                libc::ENOENT => 127,
                libc::EACCES => 126,
                _ => 1,
            },
            _ => 1,
        }
    }

    /// 致命的エラーか（プロセスを終了すべきか）。
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::Terminal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_not_found_message_and_status() {
        let e = ShellError::Spawn {
            command: "nope".to_string(),
            errno: libc::ENOENT,
        };
        assert_eq!(e.to_string(), "flash: nope: command not found");
        assert_eq!(e.exit_status(), 127);
        assert!(!e.is_fatal());
    }

    #[test]
    fn spawn_permission_denied_status() {
        let e = ShellError::Spawn {
            command: "x".to_string(),
            errno: libc::EACCES,
        };
        assert_eq!(e.exit_status(), 126);
    }

    #[test]
    fn terminal_error_is_fatal() {
        let e = ShellError::Terminal {
            op: "tcgetattr",
            source: io::Error::from_raw_os_error(libc::ENOTTY),
        };
        assert!(e.is_fatal());
        assert!(e.to_string().starts_with("flash: tcgetattr: "));
    }
}
