//! ターミナルモード制御: cooked モード ⇔ raw モードの切り替え。
//!
//! raw モードは 1 行の読み取りの間だけ有効にする。[`Terminal::raw_guard`] が返す
//! [`RawGuard`] の Drop で元の termios に戻るため、`read_line` から抜ける経路
//! （確定・キャンセル・EOF・I/O エラー・パニック）すべてで復元される。
//!
//! 復元は冪等: raw モードが有効なときだけ元の設定を書き戻す。
//! よって 1 回の raw 化に対して復元はちょうど 1 回になる。
//!
//! ## termios 設定
//!
//! | フラグ | 操作 | 理由 |
//! |--------|------|------|
//! | `c_iflag` | `IXON` OFF | Ctrl+S/Ctrl+Q をキー入力として受信 |
//! | `c_lflag` | `ECHO\|ECHOE\|ICANON\|ISIG\|IEXTEN` OFF | エコー無効、1 バイトずつ読み取り、Ctrl+C/Z をキー入力として受信 |
//! | `VMIN`/`VTIME` | `1` / `0` | 最低 1 バイトで即座に返る |
//!
//! `ICRNL` と `OPOST` は ON のまま（Enter は `\n` で届き、出力の `\n` は `\r\n` に変換される）。

use std::io;

use crate::error::ShellError;

// ── ModeBackend ───────────────────────────────────────────────────

/// termios の取得・適用を抽象化する。本番は [`Termios`]、テストでは記録用の実装を使う。
pub trait ModeBackend {
    fn get(&self) -> io::Result<libc::termios>;
    fn set(&self, mode: &libc::termios) -> io::Result<()>;
}

/// `tcgetattr` / `tcsetattr(TCSAFLUSH)` で fd のモードを操作する。
pub struct Termios {
    fd: i32,
}

impl Termios {
    pub fn new(fd: i32) -> Self {
        Self { fd }
    }

    /// 標準入力（制御端末）を対象にする。
    pub fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO)
    }
}

impl ModeBackend for Termios {
    fn get(&self) -> io::Result<libc::termios> {
        let mut mode: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(self.fd, &mut mode) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(mode)
    }

    fn set(&self, mode: &libc::termios) -> io::Result<()> {
        if unsafe { libc::tcsetattr(self.fd, libc::TCSAFLUSH, mode) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

/// 元の設定から raw モード用の termios を作る。
pub fn make_raw(orig: &libc::termios) -> libc::termios {
    let mut raw = *orig;
    raw.c_iflag &= !libc::IXON;
    raw.c_lflag &= !(libc::ECHO | libc::ECHOE | libc::ICANON | libc::ISIG | libc::IEXTEN);
    raw.c_cc[libc::VMIN] = 1;
    raw.c_cc[libc::VTIME] = 0;
    raw
}

// ── Terminal ──────────────────────────────────────────────────────

/// ターミナルモードの状態。シェルセッションが 1 つ所有する。
pub struct Terminal<B: ModeBackend = Termios> {
    backend: B,
    /// raw 化の直前に保存した元の設定。
    orig: Option<libc::termios>,
    /// raw モードが有効か。
    raw: bool,
}

impl<B: ModeBackend> Terminal<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            orig: None,
            raw: false,
        }
    }

    /// 現在の設定を保存し、raw モードを適用する。既に raw なら何もしない。
    pub fn enter_raw_mode(&mut self) -> Result<(), ShellError> {
        if self.raw {
            return Ok(());
        }
        let orig = self.backend.get().map_err(|source| ShellError::Terminal {
            op: "tcgetattr",
            source,
        })?;
        self.backend
            .set(&make_raw(&orig))
            .map_err(|source| ShellError::Terminal {
                op: "tcsetattr",
                source,
            })?;
        self.orig = Some(orig);
        self.raw = true;
        tracing::trace!("terminal: raw mode on");
        Ok(())
    }

    /// 保存した元の設定を書き戻す。raw モードでなければ何もしない。
    pub fn restore_mode(&mut self) -> Result<(), ShellError> {
        if !self.raw {
            return Ok(());
        }
        self.raw = false;
        if let Some(orig) = self.orig.as_ref() {
            self.backend
                .set(orig)
                .map_err(|source| ShellError::Terminal {
                    op: "tcsetattr",
                    source,
                })?;
            tracing::trace!("terminal: mode restored");
        }
        Ok(())
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// raw モードに入り、スコープを抜けたら復元するガードを返す。
    pub fn raw_guard(&mut self) -> Result<RawGuard<'_, B>, ShellError> {
        self.enter_raw_mode()?;
        Ok(RawGuard { terminal: self })
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: ModeBackend> Drop for Terminal<B> {
    fn drop(&mut self) {
        if let Err(e) = self.restore_mode() {
            eprintln!("{}", e);
        }
    }
}

// ── RawGuard ──────────────────────────────────────────────────────

/// RAII ガード。Drop で [`Terminal::restore_mode`] を呼ぶ。
///
/// 明示的に [`RawGuard::restore`] を呼べば復元エラーを呼び出し側で扱える。
pub struct RawGuard<'a, B: ModeBackend> {
    terminal: &'a mut Terminal<B>,
}

impl<B: ModeBackend> RawGuard<'_, B> {
    // この後の Drop では raw == false のため二重に書き戻さない
    pub fn restore(self) -> Result<(), ShellError> {
        self.terminal.restore_mode()
    }
}

impl<B: ModeBackend> Drop for RawGuard<'_, B> {
    fn drop(&mut self) {
        if let Err(e) = self.terminal.restore_mode() {
            eprintln!("{}", e);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────
