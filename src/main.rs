//! flash — raw モード行エディタを持つ小さな対話シェル
//!
//! REPLループ: プロンプト表示 → 行エディタで入力読み取り → 履歴に追加 → 実行 → ループ
//!
//! モジュール構成は [`flash`] ライブラリのドキュメントを参照。

use std::io::{self, Write};

use flash::config::{self, Config};
use flash::editor::LineEditor;
use flash::shell::{self, Shell};
use tracing_subscriber::EnvFilter;

/// `FLASH_LOG` のフィルタで stderr 向けの subscriber を設定する。不正なフィルタは既定値に戻す。
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_banner() {
    println!("---------------------------------------------");
    println!("|   ⚡ Welcome to flash!                     |");
    println!("|      Enjoy your quick stay.               |");
    println!("---------------------------------------------");
}

/// カレントディレクトリの行とプロンプトを出力する。
fn print_prompt(config: &Config) {
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "?".to_string());
    print!("\n{}\n{}", cwd, config.prompt);
    let _ = io::stdout().flush();
}

fn main() {
    let config = Config::from_env();
    init_tracing(&config);
    if config.banner {
        print_banner();
    }

    // シグナル設定: シェル自体は SIGINT/SIGTSTP を無視する。
    // 子プロセスは posix_spawnattr の POSIX_SPAWN_SETSIGDEF で SIG_DFL にリセットされる。
    shell::install_signal_policy();

    let mut shell = Shell::new();
    let mut editor = LineEditor::stdio();

    loop {
        print_prompt(&config);

        match shell.step(&mut editor) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_fatal() => {
                // ターミナルを制御できない: これ以上続けられない
                eprintln!("{}", e);
                shell.finish();
                std::process::exit(1);
            }
            Err(e) => {
                // 入力を読めない: EOF と同じくセッションを終える
                eprintln!("{}", e);
                shell.last_status = e.exit_status();
                break;
            }
        }
    }

    std::process::exit(shell.finish());
}
