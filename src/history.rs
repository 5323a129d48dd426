//! コマンド履歴の管理。
//!
//! セッション中のみメモリ上に保持する（永続化しない）。追加のみで、削除・並べ替えはしない。
//! ↑↓キーによるナビゲーションは [`BrowseCursor`] が担当し、履歴本体は変更しない。
//!
//! ## ナビゲーション
//!
//! [`BrowseCursor`] の位置は `entries` のインデックスで、`entries.len()` は
//! 「履歴を閲覧していない（現在の入力）」を意味する。
//! ↑で最古のエントリまで遡り、そこで止まる（折り返さない）。
//! ↓で最新エントリを越えると空行に戻る。

/// コマンド履歴。古い順に保持する。
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// エントリ追加。空白のみの行はスキップ。テキストは入力されたまま保存する。
    pub fn append(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        self.entries.push(line.to_string());
    }

    /// 全エントリを古い順に返す。何度でも呼び直せる。
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 新しい閲覧カーソルを作る（「閲覧していない」位置から開始）。
    pub fn browse(&self) -> BrowseCursor {
        BrowseCursor {
            index: self.entries.len(),
        }
    }
}

/// 1 行の読み取り中だけ使う履歴の閲覧位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowseCursor {
    index: usize,
}

impl BrowseCursor {
    /// ↑: 一つ古いエントリへ移動して返す。最古で止まる。履歴が空なら `None`。
    pub fn prev<'h>(&mut self, history: &'h History) -> Option<&'h str> {
        if history.is_empty() {
            return None;
        }
        let len = history.len();
        if self.index > len {
            self.index = len;
        }
        if self.index > 0 {
            self.index -= 1;
        }
        history.get(self.index)
    }

    /// ↓: 一つ新しいエントリへ移動して返す。最新を越えたら「閲覧していない」位置に戻り、
    /// 空行を返す。
    pub fn next<'h>(&mut self, history: &'h History) -> &'h str {
        let len = history.len();
        if self.index + 1 < len {
            self.index += 1;
            history.get(self.index).unwrap_or("")
        } else {
            self.index = len;
            ""
        }
    }

    /// 履歴を閲覧していない位置にいるか。
    pub fn at_end(&self, history: &History) -> bool {
        self.index >= history.len()
    }
}
