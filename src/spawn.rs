//! `posix_spawnp()` の安全な Rust ラッパー。
//!
//! fork + exec の代わりに `posix_spawnp` で外部コマンドを起動する。
//! PATH 検索は `posix_spawnp` 自身（OS の標準の検索）に任せる。
//!
//! ## 構成
//!
//! | 型 | 役割 |
//! |-----|------|
//! | [`SpawnAttr`] | `posix_spawnattr_t` の RAII ラッパー（シグナルを既定動作に戻す） |
//! | [`CStringVec`] | argv 用の NULL 終端ポインタ配列 |
//! | [`spawn`] | 上記を組み合わせて `posix_spawnp` を呼ぶ公開関数 |

use std::ffi::CString;

use crate::error::ShellError;

/// 子プロセスで既定動作に戻すシグナル。シェルはこれらを無視している。
pub const RESET_SIGNALS: [libc::c_int; 2] = [libc::SIGINT, libc::SIGTSTP];

// ── SpawnAttr ─────────────────────────────────────────────────────

/// `posix_spawnattr_t` の RAII ラッパー。Drop で自動 destroy。
struct SpawnAttr {
    inner: libc::posix_spawnattr_t,
}

impl SpawnAttr {
    fn new() -> Result<Self, i32> {
        unsafe {
            let mut attr: libc::posix_spawnattr_t = std::mem::zeroed();
            let ret = libc::posix_spawnattr_init(&mut attr);
            if ret != 0 {
                return Err(ret);
            }
            Ok(Self { inner: attr })
        }
    }

    /// `POSIX_SPAWN_SETSIGDEF` で [`RESET_SIGNALS`] を `SIG_DFL` にリセットする。
    ///
    /// `SIG_IGN` は exec をまたいで引き継がれるため、子で明示的に戻さないと
    /// 外部コマンドが Ctrl+C / Ctrl+Z で止まらなくなる。
    fn set_sigdefault(&mut self) {
        unsafe {
            let mut flags: libc::c_short = 0;
            libc::posix_spawnattr_getflags(&self.inner, &mut flags);
            flags |= libc::POSIX_SPAWN_SETSIGDEF as libc::c_short;
            libc::posix_spawnattr_setflags(&mut self.inner, flags);

            let mut sigset: libc::sigset_t = std::mem::zeroed();
            libc::sigemptyset(&mut sigset);
            for sig in RESET_SIGNALS {
                libc::sigaddset(&mut sigset, sig);
            }
            libc::posix_spawnattr_setsigdefault(&mut self.inner, &sigset);
        }
    }

    fn as_ptr(&self) -> *const libc::posix_spawnattr_t {
        &self.inner
    }
}

impl Drop for SpawnAttr {
    fn drop(&mut self) {
        unsafe {
            libc::posix_spawnattr_destroy(&mut self.inner);
        }
    }
}

// ── CStringVec ────────────────────────────────────────────────────

/// argv 用の CString ベクタ。NULL 終端のポインタ配列を構築する。
struct CStringVec {
    _strings: Vec<CString>,
    ptrs: Vec<*mut libc::c_char>,
}

impl CStringVec {
    /// 引数リストから構築する。NUL バイトを含む引数があれば `None`。
    fn from_args(args: &[&str]) -> Option<Self> {
        let strings = args
            .iter()
            .map(|s| CString::new(*s).ok())
            .collect::<Option<Vec<CString>>>()?;
        let mut ptrs: Vec<*mut libc::c_char> = strings
            .iter()
            .map(|s| s.as_ptr() as *mut libc::c_char)
            .collect();
        ptrs.push(std::ptr::null_mut()); // NULL 終端
        Some(Self {
            _strings: strings,
            ptrs,
        })
    }

    fn as_ptr(&self) -> *const *mut libc::c_char {
        self.ptrs.as_ptr()
    }

    fn program(&self) -> *const libc::c_char {
        self.ptrs[0]
    }
}

// ── spawn 関数 ────────────────────────────────────────────────────

/// `posix_spawnp` で子プロセスを起動する。成功時は子 PID を返す。
///
/// `args[0]` がコマンド名（PATH 検索付き）。環境変数はシェルのものを継承する。
/// 起動に失敗した場合（コマンドが見つからない、実行権限がない、プロセス数上限など）は
/// `errno` を持つ [`ShellError::Spawn`] を返す。
pub fn spawn(args: &[&str]) -> Result<libc::pid_t, ShellError> {
    let command = args.first().copied().unwrap_or_default().to_string();
    let spawn_error = |errno| ShellError::Spawn {
        command: command.clone(),
        errno,
    };

    if args.is_empty() {
        return Err(spawn_error(libc::EINVAL));
    }
    let argv = CStringVec::from_args(args).ok_or_else(|| spawn_error(libc::EINVAL))?;

    let mut attr = SpawnAttr::new().map_err(spawn_error)?;
    attr.set_sigdefault();

    // environ を継承
    extern "C" {
        static environ: *const *mut libc::c_char;
    }

    let mut pid: libc::pid_t = 0;
    let ret = unsafe {
        libc::posix_spawnp(
            &mut pid,
            argv.program(),
            std::ptr::null(),
            attr.as_ptr(),
            argv.as_ptr(),
            environ,
        )
    };

    if ret != 0 {
        return Err(spawn_error(ret));
    }

    tracing::debug!(pid, command = %command, "spawn: child started");
    Ok(pid)
}
