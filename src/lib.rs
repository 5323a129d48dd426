//! flash ライブラリ — バイナリ・ベンチマーク・テスト用にモジュールを公開する。
//!
//! バイナリ本体は `main.rs` の REPL ループ。
//!
//! ## モジュール構成
//!
//! | モジュール | 役割 |
//! |-----------|------|
//! | [`terminal`] | ターミナルモード制御（raw ⇔ cooked、RAII による復元保証） |
//! | [`editor`] | 行エディタ（キー入力、エスケープシーケンス、バッファ操作、差分描画） |
//! | [`history`] | コマンド履歴（セッション内のみ、↑↓ の閲覧カーソル） |
//! | [`parser`] | 空白区切りのトークナイズとビルトイン解決 |
//! | [`builtins`] | ビルトイン（`exit`, `history`, `cd`） |
//! | [`executor`] | コマンド実行（ビルトイン振り分け、外部コマンドの起動と待機） |
//! | [`spawn`] | `posix_spawnp` ラッパー（子プロセスのシグナルを既定動作に戻す） |
//! | [`shell`] | シェルセッション（履歴・ターミナル・終了ステータス、シグナル設定） |
//! | [`error`] | エラー型 |
//! | [`config`] | 環境変数からの実行時設定 |

pub mod builtins;
pub mod config;
pub mod editor;
pub mod error;
pub mod executor;
pub mod history;
pub mod parser;
pub mod shell;
pub mod spawn;
pub mod terminal;
