//! 行エディタ: raw モード、キー入力、バッファ操作、差分表示更新。
//!
//! ターミナルを raw モードに切り替え、1 バイトずつ読み取って 1 行を組み立てる。
//! 入出力は `libc`（`read(2)`, `write(2)`）を直接使い、Rust の stdio バッファを経由しない。
//!
//! ## アーキテクチャ
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │ LineEditor::read_line(terminal, history)         │
//! │  ┌──────────┐  ┌──────────┐  ┌───────────────┐  │
//! │  │ RawGuard │  │KeyReader │  │ LineBuffer    │  │
//! │  │ (RAII)   │  │ (入力)   │  │ (編集)        │  │
//! │  └──────────┘  └──────────┘  └───────────────┘  │
//! │       │              │              │            │
//! │  terminal.rs    Read (1 byte)   Write (差分)     │
//! │                      │                           │
//! │               ┌──────┴──────┐                    │
//! │               │ BrowseCursor│                    │
//! │               │ (↑↓ 履歴)   │                    │
//! │               └─────────────┘                    │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## 表示更新
//!
//! 全行再描画はしない。編集のたびにカーソル位置から行末までだけを描き直し、
//! `ESC[s` / `ESC[u` でカーソルを論理位置に戻す。
//! 1 キー分の出力は 1 つの文字列に組み立ててから 1 回で書き出すため、
//! 描画の途中で次のバイトを読むことはない。
//!
//! カーソル位置は文字数で数える（全角文字の表示幅は考慮しない）。

use std::io::{self, Read, Write};

use crate::error::ShellError;
use crate::history::{BrowseCursor, History};
use crate::terminal::{ModeBackend, Terminal};

/// カーソル位置を保存し、行末までクリアする。
const SAVE_AND_CLEAR: &str = "\x1b[s\x1b[K";
/// 保存したカーソル位置に戻る。
const RESTORE: &str = "\x1b[u";

// ── ReadOutcome ───────────────────────────────────────────────────

/// 1 行読み取りの結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Enter で確定した行（空文字列もありうる）。
    Submitted(String),
    /// Ctrl+C で入力を破棄した。履歴にも実行にも回さない。
    Cancelled,
    /// 入力ストリームの終端、または空バッファでの Ctrl+D。
    Eof,
}

// ── Key 入力 ──────────────────────────────────────────────────────

/// raw モードで読み取ったキー入力を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// 通常の印字可能文字（ASCII + UTF-8）。
    Char(char),
    /// Enter キー（LF `\n` または CR `\r`）。
    Enter,
    /// Backspace（DEL `0x7f` または BS `0x08`）。
    Backspace,
    /// Delete キー（`ESC [ 3 ~`）。
    Delete,
    /// 左矢印（`ESC [ D`）。
    Left,
    /// 右矢印（`ESC [ C`）。
    Right,
    /// 上矢印（`ESC [ A`）— 履歴を遡る。
    Up,
    /// 下矢印（`ESC [ B`）— 履歴を進む。
    Down,
    /// Home（`ESC [ H` / `ESC [ 1 ~` / Ctrl+A）。
    Home,
    /// End（`ESC [ F` / `ESC [ 4 ~` / Ctrl+E）。
    End,
    /// Ctrl+C（`0x03`）— 現在の入力を破棄する。
    CtrlC,
    /// Ctrl+D（`0x04`）— 空バッファなら EOF、それ以外は無視。
    CtrlD,
    /// 未対応のバイト列。無視される。
    Unknown,
}

/// 1 バイトの押し戻しを持つキー入力リーダー。
///
/// 不正な UTF-8 の継続バイト位置に来たバイト（`\n` や `0x03` など）は捨てずに押し戻し、
/// 次のキーとして解釈する。
pub struct KeyReader<R: Read> {
    input: R,
    pending: Option<u8>,
}

impl<R: Read> KeyReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            pending: None,
        }
    }

    /// 1 バイト読み取る。押し戻したバイトがあればそれを返す。EOF なら `None`。`EINTR` は読み直す。
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.pending.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// ESC (`\x1b`) 後のエスケープシーケンスを解析する。
    ///
    /// `[` + 終端バイトの 2 バイト、または `[` + 数字 + `~` の 3 バイトを読む。
    /// タイムアウトは使わない。未対応のシーケンスは `Unknown` として読み捨てる。
    fn read_escape_seq(&mut self) -> io::Result<Key> {
        let Some(bracket) = self.read_byte()? else {
            return Ok(Key::Unknown);
        };
        let Some(fin) = self.read_byte()? else {
            return Ok(Key::Unknown);
        };
        if bracket != b'[' {
            return Ok(Key::Unknown);
        }

        let key = match fin {
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' => Key::Right,
            b'D' => Key::Left,
            b'H' => Key::Home,
            b'F' => Key::End,
            b'0'..=b'9' => {
                let tilde = self.read_byte()? == Some(b'~');
                match fin {
                    b'1' if tilde => Key::Home,
                    b'3' if tilde => Key::Delete,
                    b'4' if tilde => Key::End,
                    _ => Key::Unknown,
                }
            }
            _ => Key::Unknown,
        };
        Ok(key)
    }

    /// UTF-8 マルチバイト文字の残りのバイトを読み取り、`Key::Char` に変換する。
    ///
    /// 継続バイト（`10xxxxxx`）でないバイトが来たら押し戻して `Key::Unknown` を返す。
    fn read_utf8(&mut self, first: u8, expected_len: usize) -> io::Result<Key> {
        let mut buf = [0u8; 4];
        buf[0] = first;
        for slot in buf.iter_mut().take(expected_len).skip(1) {
            match self.read_byte()? {
                Some(b) if b & 0xC0 == 0x80 => *slot = b,
                Some(b) => {
                    self.pending = Some(b);
                    return Ok(Key::Unknown);
                }
                None => return Ok(Key::Unknown),
            }
        }
        let key = match std::str::from_utf8(&buf[..expected_len]) {
            Ok(s) => s.chars().next().map_or(Key::Unknown, Key::Char),
            Err(_) => Key::Unknown,
        };
        Ok(key)
    }

    /// 1 キー分のバイト列を読み取り、[`Key`] に変換する。入力の終端なら `None`。
    ///
    /// 先頭バイトで分岐:
    /// - `\n` / `\r` → Enter
    /// - `0x7f` / `0x08` → Backspace
    /// - `0x1b` → エスケープシーケンス
    /// - `0x01` / `0x03` / `0x04` / `0x05` → Home / CtrlC / CtrlD / End
    /// - `0x20`〜`0x7e` → ASCII 印字可能文字
    /// - `0xC0`〜`0xF7` → UTF-8 マルチバイト文字
    pub fn read_key(&mut self) -> io::Result<Option<Key>> {
        let Some(byte) = self.read_byte()? else {
            return Ok(None);
        };

        let key = match byte {
            b'\n' | b'\r' => Key::Enter,
            0x7f | 0x08 => Key::Backspace,
            0x1b => self.read_escape_seq()?,
            1 => Key::Home,
            3 => Key::CtrlC,
            4 => Key::CtrlD,
            5 => Key::End,
            b if (32..127).contains(&b) => Key::Char(b as char),
            b if b & 0xE0 == 0xC0 => self.read_utf8(b, 2)?,
            b if b & 0xF0 == 0xE0 => self.read_utf8(b, 3)?,
            b if b & 0xF8 == 0xF0 => self.read_utf8(b, 4)?,
            _ => Key::Unknown,
        };
        Ok(Some(key))
    }
}

// ── LineBuffer ────────────────────────────────────────────────────

/// 編集中の 1 行。文字列とカーソル位置（`0..=len`、文字単位）を持つ。
///
/// 挿入・削除は `Vec<char>` の `insert` / `remove` で行い、範囲外アクセスは起こらない。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    chars: Vec<char>,
    cursor: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// カーソルから行末までのテキスト。
    pub fn tail(&self) -> String {
        self.chars[self.cursor..].iter().collect()
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    /// 内容を置き換え、カーソルを行末に置く。
    pub fn replace(&mut self, text: &str) {
        self.chars = text.chars().collect();
        self.cursor = self.chars.len();
    }

    /// カーソル位置に 1 文字挿入し、カーソルをその文字の直後に進める。
    pub fn insert(&mut self, ch: char) {
        self.chars.insert(self.cursor, ch);
        self.cursor += 1;
    }

    /// Delete: カーソル位置の 1 文字を削除する。行末では何もしない。
    pub fn delete_forward(&mut self) -> bool {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
            true
        } else {
            false
        }
    }

    /// Backspace: カーソル直前の 1 文字を削除する。行頭では何もしない。
    pub fn backspace(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.chars.remove(self.cursor);
            true
        } else {
            false
        }
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor < self.chars.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// 行頭へ移動し、移動した文字数を返す。
    pub fn move_home(&mut self) -> usize {
        std::mem::take(&mut self.cursor)
    }

    /// 行末へ移動し、移動した文字数を返す。
    pub fn move_end(&mut self) -> usize {
        let moved = self.chars.len() - self.cursor;
        self.cursor = self.chars.len();
        moved
    }
}

// ── 生の fd 入出力 ────────────────────────────────────────────────

/// `libc::read` で直接読む `Read` 実装（Rust の stdin バッファをバイパス）。
pub struct FdReader(pub i32);

impl Read for FdReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(self.0, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }
}

/// `libc::write` で直接書く `Write` 実装（Rust の stdout バッファをバイパス）。
pub struct FdWriter(pub i32);

impl Write for FdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(self.0, buf.as_ptr() as *const libc::c_void, buf.len()) };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── LineEditor ────────────────────────────────────────────────────

/// 行エディタ本体。入力元・出力先・編集中のバッファを保持する。
///
/// REPL ループの開始時に [`LineEditor::stdio`] で生成し、毎プロンプトで
/// [`LineEditor::read_line`] を呼ぶ。raw モードは `read_line` 内でのみ有効。
pub struct LineEditor<R: Read = FdReader, W: Write = FdWriter> {
    keys: KeyReader<R>,
    output: W,
    buf: LineBuffer,
}

impl LineEditor<FdReader, FdWriter> {
    /// 標準入力・標準出力を直接使うエディタ。
    pub fn stdio() -> Self {
        Self::new(FdReader(libc::STDIN_FILENO), FdWriter(libc::STDOUT_FILENO))
    }
}

impl<R: Read, W: Write> LineEditor<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            keys: KeyReader::new(input),
            output,
            buf: LineBuffer::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn output(&self) -> &W {
        &self.output
    }

    /// raw モードで 1 行読み取る。
    ///
    /// 終了時は raw モードを抜けてから改行を出力する。
    /// Enter → `Submitted`, Ctrl+C → `Cancelled`, 入力終端 / 空バッファでの Ctrl+D → `Eof`。
    pub fn read_line<B: ModeBackend>(
        &mut self,
        terminal: &mut Terminal<B>,
        history: &History,
    ) -> Result<ReadOutcome, ShellError> {
        self.buf.clear();
        let mut browse = history.browse();

        let raw = terminal.raw_guard()?;
        let outcome = loop {
            let Some(key) = self.keys.read_key()? else {
                break ReadOutcome::Eof;
            };
            let mut out = String::new();
            match key {
                Key::Enter => break ReadOutcome::Submitted(self.buf.text()),
                Key::CtrlC => break ReadOutcome::Cancelled,
                Key::CtrlD if self.buf.is_empty() => break ReadOutcome::Eof,
                Key::CtrlD | Key::Unknown => continue,
                Key::Char(ch) => self.insert_char(ch, &mut out),
                Key::Backspace => self.backspace(&mut out),
                Key::Delete => self.delete_forward(&mut out),
                Key::Left => {
                    if self.buf.move_left() {
                        out.push_str("\x1b[1D");
                    }
                }
                Key::Right => {
                    if self.buf.move_right() {
                        out.push_str("\x1b[1C");
                    }
                }
                Key::Home => push_move(&mut out, self.buf.move_home(), 'D'),
                Key::End => push_move(&mut out, self.buf.move_end(), 'C'),
                Key::Up => self.history_prev(&mut browse, history, &mut out),
                Key::Down => self.history_next(&mut browse, history, &mut out),
            }
            self.emit(&out)?;
        };
        raw.restore()?;

        self.emit("\n")?;
        tracing::trace!(?outcome, "editor: line read");
        Ok(outcome)
    }

    // ── 編集 + 差分描画 ───────────────────────────────────────────

    /// 挿入した文字を書き、後続テキストを描き直してカーソルを戻す。
    fn insert_char(&mut self, ch: char, out: &mut String) {
        self.buf.insert(ch);
        out.push(ch);
        self.redraw_tail(out);
    }

    fn backspace(&mut self, out: &mut String) {
        if self.buf.backspace() {
            out.push('\x08');
            self.redraw_tail(out);
        }
    }

    fn delete_forward(&mut self, out: &mut String) {
        if self.buf.delete_forward() {
            self.redraw_tail(out);
        }
    }

    /// カーソル位置から行末までを描き直す。カーソルは論理位置に戻る。
    fn redraw_tail(&self, out: &mut String) {
        out.push_str(SAVE_AND_CLEAR);
        out.push_str(&self.buf.tail());
        out.push_str(RESTORE);
    }

    // ── 履歴ナビゲーション ────────────────────────────────────────

    /// ↑: 履歴を一つ遡り、バッファを置き換える。履歴が空なら何もしない。
    fn history_prev(&mut self, browse: &mut BrowseCursor, history: &History, out: &mut String) {
        if let Some(entry) = browse.prev(history) {
            self.substitute(entry, out);
        }
    }

    /// ↓: 履歴を一つ進む。最新エントリを越えたら空行。
    fn history_next(&mut self, browse: &mut BrowseCursor, history: &History, out: &mut String) {
        let entry = browse.next(history);
        self.substitute(entry, out);
    }

    /// 入力欄の先頭に戻り、置き換えた行を書いて行末までクリアする。
    fn substitute(&mut self, text: &str, out: &mut String) {
        push_move(out, self.buf.cursor(), 'D');
        self.buf.replace(text);
        out.push_str(text);
        out.push_str("\x1b[K");
    }

    /// 1 キー分の出力を 1 回で書き出す。
    fn emit(&mut self, s: &str) -> io::Result<()> {
        if s.is_empty() {
            return Ok(());
        }
        self.output.write_all(s.as_bytes())?;
        self.output.flush()
    }
}

/// `ESC[{n}{dir}` でカーソルを n 桁動かす。n == 0 なら何も出さない。
fn push_move(out: &mut String, n: usize, dir: char) {
    if n > 0 {
        out.push_str(&format!("\x1b[{}{}", n, dir));
    }
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::tests::Recording;
    use std::io::Cursor;

    type TestEditor = LineEditor<Cursor<Vec<u8>>, Vec<u8>>;

    fn test_editor(input: &[u8]) -> TestEditor {
        LineEditor::new(Cursor::new(input.to_vec()), Vec::new())
    }

    fn read(input: &[u8], history: &History) -> ReadOutcome {
        let mut term = Terminal::new(Recording::new());
        let mut ed = test_editor(input);
        ed.read_line(&mut term, history).unwrap()
    }

    fn output_of(ed: &TestEditor) -> String {
        String::from_utf8(ed.output().clone()).unwrap()
    }

    fn history(entries: &[&str]) -> History {
        let mut h = History::new();
        for e in entries {
            h.append(e);
        }
        h
    }

    // ── LineBuffer ──

    fn buffer(text: &str, cursor: usize) -> LineBuffer {
        let mut b = LineBuffer::new();
        b.replace(text);
        b.cursor = cursor;
        b
    }

    #[test]
    fn insert_char_at_end() {
        let mut b = LineBuffer::new();
        b.insert('a');
        b.insert('b');
        b.insert('c');
        assert_eq!(b.text(), "abc");
        assert_eq!(b.cursor(), 3);
    }

    #[test]
    fn insert_char_at_middle() {
        let mut b = buffer("ac", 1);
        b.insert('b');
        assert_eq!(b.text(), "abc");
        assert_eq!(b.cursor(), 2);
    }

    #[test]
    fn backspace_and_boundaries() {
        let mut b = buffer("abc", 3);
        assert!(b.backspace());
        assert_eq!(b.text(), "ab");
        assert_eq!(b.cursor(), 2);

        let mut b = buffer("abc", 0);
        assert!(!b.backspace()); // no-op
        assert_eq!(b.text(), "abc");
        assert_eq!(b.cursor(), 0);
    }

    #[test]
    fn delete_forward_and_boundaries() {
        let mut b = buffer("abc", 1);
        assert!(b.delete_forward());
        assert_eq!(b.text(), "ac");
        assert_eq!(b.cursor(), 1);

        let mut b = buffer("abc", 3);
        assert!(!b.delete_forward()); // no-op
        assert_eq!(b.text(), "abc");
    }

    #[test]
    fn insert_then_delete_forward_is_identity() {
        for pos in 0..=4 {
            let before = buffer("abcd", pos);
            let mut b = before.clone();
            b.insert('x');
            b.move_left();
            b.delete_forward();
            assert_eq!(b, before, "pos = {}", pos);
        }
    }

    #[test]
    fn move_left_right_home_end() {
        let mut b = buffer("hello", 3);
        assert!(b.move_left());
        assert_eq!(b.cursor(), 2);
        assert!(b.move_right());
        assert_eq!(b.move_home(), 3);
        assert!(!b.move_left());
        assert_eq!(b.move_end(), 5);
        assert!(!b.move_right());
        assert_eq!(b.cursor(), 5);
    }

    #[test]
    fn random_edits_keep_cursor_in_bounds() {
        // 線形合同法で決定的な操作列を作る
        let mut seed: u32 = 12345;
        let mut next = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (seed >> 16) % 7
        };
        let mut b = LineBuffer::new();
        let mut model: Vec<char> = Vec::new();
        for i in 0..2000 {
            match next() {
                0 | 1 => {
                    let ch = char::from(b'a' + (i % 26) as u8);
                    model.insert(b.cursor(), ch);
                    b.insert(ch);
                }
                2 => {
                    if b.cursor() > 0 {
                        model.remove(b.cursor() - 1);
                    }
                    b.backspace();
                }
                3 => {
                    if b.cursor() < model.len() {
                        model.remove(b.cursor());
                    }
                    b.delete_forward();
                }
                4 => {
                    b.move_left();
                }
                5 => {
                    b.move_right();
                }
                _ => {
                    if i % 2 == 0 {
                        b.move_home();
                    } else {
                        b.move_end();
                    }
                }
            }
            assert!(b.cursor() <= b.len());
            assert_eq!(b.len(), b.text().chars().count());
            assert_eq!(b.text(), model.iter().collect::<String>());
        }
    }

    #[test]
    fn utf8_insert_and_move() {
        let out = read("あい\x1b[D\x1b[Dう\n".as_bytes(), &History::new());
        assert_eq!(out, ReadOutcome::Submitted("うあい".to_string()));
    }

    #[test]
    fn invalid_utf8_does_not_swallow_enter() {
        let mut term = Terminal::new(Recording::new());
        let h = History::new();
        // 0xE9 は 3 バイト列の先頭だが、続く '\n' は継続バイトではない
        let mut ed = test_editor(b"caf\xe9\nls\n");
        assert_eq!(
            ed.read_line(&mut term, &h).unwrap(),
            ReadOutcome::Submitted("caf".to_string())
        );
        assert_eq!(
            ed.read_line(&mut term, &h).unwrap(),
            ReadOutcome::Submitted("ls".to_string())
        );
    }

    #[test]
    fn invalid_utf8_keeps_following_control_keys() {
        assert_eq!(read(b"ab\xf0\x03", &History::new()), ReadOutcome::Cancelled);
        assert_eq!(read(b"\xc3\x04", &History::new()), ReadOutcome::Eof);
        // 途中で切れた列の後の文字はそのまま入力される
        assert_eq!(
            read(b"x\xc3y\n", &History::new()),
            ReadOutcome::Submitted("xy".to_string())
        );
    }

    // ── キー解析 ──

    #[test]
    fn read_key_sequences() {
        let mut input = KeyReader::new(Cursor::new(b"\x1b[A\x1b[B\x1b[C\x1b[D\x1b[3~\x1b[1~\x1b[4~\x1b[Z\x1bOA".to_vec()));
        let keys: Vec<Key> = std::iter::from_fn(|| input.read_key().unwrap()).collect();
        assert_eq!(
            keys,
            vec![
                Key::Up,
                Key::Down,
                Key::Right,
                Key::Left,
                Key::Delete,
                Key::Home,
                Key::End,
                Key::Unknown,
                Key::Unknown,
            ]
        );
    }

    #[test]
    fn read_key_eof() {
        let mut input = KeyReader::new(Cursor::new(Vec::new()));
        assert_eq!(input.read_key().unwrap(), None);
    }

    // ── read_line ──

    #[test]
    fn submit_plain_line() {
        assert_eq!(
            read(b"ls -la\n", &History::new()),
            ReadOutcome::Submitted("ls -la".to_string())
        );
    }

    #[test]
    fn carriage_return_submits() {
        assert_eq!(
            read(b"pwd\r", &History::new()),
            ReadOutcome::Submitted("pwd".to_string())
        );
    }

    #[test]
    fn empty_line_is_distinct_from_cancel() {
        assert_eq!(read(b"\n", &History::new()), ReadOutcome::Submitted(String::new()));
        assert_eq!(read(b"abc\x03", &History::new()), ReadOutcome::Cancelled);
    }

    #[test]
    fn cancel_stops_reading() {
        let mut term = Terminal::new(Recording::new());
        let mut ed = test_editor(b"abc\x03def\n");
        let h = History::new();
        assert_eq!(ed.read_line(&mut term, &h).unwrap(), ReadOutcome::Cancelled);
        // 残りの入力は次の読み取りで使われ、前の行は持ち越さない
        assert_eq!(
            ed.read_line(&mut term, &h).unwrap(),
            ReadOutcome::Submitted("def".to_string())
        );
    }

    #[test]
    fn eof_and_ctrl_d() {
        assert_eq!(read(b"", &History::new()), ReadOutcome::Eof);
        assert_eq!(read(b"\x04", &History::new()), ReadOutcome::Eof);
        // 入力がある間の Ctrl+D は無視
        assert_eq!(
            read(b"ab\x04c\n", &History::new()),
            ReadOutcome::Submitted("abc".to_string())
        );
    }

    #[test]
    fn edit_in_middle() {
        // "abc" → ← ← → Backspace → "ac" → Home → Delete → "c" → End → "d"
        assert_eq!(
            read(b"abc\x1b[D\x1b[D\x1b[C\x7f\x01\x1b[3~\x05d\n", &History::new()),
            ReadOutcome::Submitted("cd".to_string())
        );
    }

    #[test]
    fn unknown_escape_is_absorbed() {
        assert_eq!(
            read(b"ab\x1b[Zc\x1b[9~\n", &History::new()),
            ReadOutcome::Submitted("abc".to_string())
        );
    }

    #[test]
    fn history_prev_recalls_newest_then_older() {
        let h = history(&["first", "second"]);
        assert_eq!(read(b"\x1b[A\n", &h), ReadOutcome::Submitted("second".to_string()));
        assert_eq!(read(b"\x1b[A\x1b[A\n", &h), ReadOutcome::Submitted("first".to_string()));
        // 最古で止まる
        assert_eq!(
            read(b"\x1b[A\x1b[A\x1b[A\x1b[A\x1b[A\n", &h),
            ReadOutcome::Submitted("first".to_string())
        );
    }

    #[test]
    fn history_next_past_newest_is_empty() {
        let h = history(&["first", "second"]);
        assert_eq!(read(b"\x1b[A\x1b[B\n", &h), ReadOutcome::Submitted(String::new()));
        assert_eq!(read(b"typed\x1b[B\n", &h), ReadOutcome::Submitted(String::new()));
    }

    #[test]
    fn recalled_line_is_editable() {
        let h = history(&["echo hello"]);
        assert_eq!(
            read(b"\x1b[A\x7f\x7f\x7f\x7f\x7fworld\n", &h),
            ReadOutcome::Submitted("echo world".to_string())
        );
    }

    #[test]
    fn history_prev_on_empty_history_keeps_buffer() {
        assert_eq!(
            read(b"ls\x1b[A\n", &History::new()),
            ReadOutcome::Submitted("ls".to_string())
        );
    }

    // ── 描画 ──

    #[test]
    fn insert_in_middle_redraws_tail_only() {
        let mut term = Terminal::new(Recording::new());
        let mut ed = test_editor(b"ac\x1b[Db\n");
        ed.read_line(&mut term, &History::new()).unwrap();
        let out = output_of(&ed);
        assert!(out.starts_with("a\x1b[s\x1b[K\x1b[u"));
        assert!(out.contains("\x1b[1D"));
        assert!(out.contains("b\x1b[s\x1b[Kc\x1b[u"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn backspace_redraw() {
        let mut term = Terminal::new(Recording::new());
        let mut ed = test_editor(b"abc\x1b[D\x7f\n");
        ed.read_line(&mut term, &History::new()).unwrap();
        assert!(output_of(&ed).contains("\x08\x1b[s\x1b[Kc\x1b[u"));
    }

    #[test]
    fn delete_forward_redraw() {
        let mut term = Terminal::new(Recording::new());
        let mut ed = test_editor(b"abc\x1b[D\x1b[D\x1b[3~\n");
        assert_eq!(
            ed.read_line(&mut term, &History::new()).unwrap(),
            ReadOutcome::Submitted("ac".to_string())
        );
        let out = output_of(&ed);
        // カーソルは動かさず、後続テキストだけを描き直す
        assert!(out.contains("\x1b[1D\x1b[1D\x1b[s\x1b[Kc\x1b[u\n"));
        assert!(!out.contains('\x08'));
    }

    #[test]
    fn noop_edits_emit_nothing() {
        let mut term = Terminal::new(Recording::new());
        let mut ed = test_editor(b"\x7f\x1b[D\x1b[3~\x1b[C\x01\x05\n");
        ed.read_line(&mut term, &History::new()).unwrap();
        assert_eq!(output_of(&ed), "\n");
    }

    #[test]
    fn history_substitution_redraw() {
        let h = history(&["pwd"]);
        let mut term = Terminal::new(Recording::new());
        let mut ed = test_editor(b"ls\x1b[A\n");
        ed.read_line(&mut term, &h).unwrap();
        assert!(output_of(&ed).contains("\x1b[2Dpwd\x1b[K"));
    }

    // ── raw モード ──

    #[test]
    fn raw_mode_restored_once_per_read() {
        let mut term = Terminal::new(Recording::new());
        let h = History::new();
        let mut ed = test_editor(b"a\nb\x03");
        ed.read_line(&mut term, &h).unwrap();
        ed.read_line(&mut term, &h).unwrap();
        assert!(!term.is_raw());
        assert!(term.backend().is_cooked());
        // (raw 化 + 復元) × 2
        assert_eq!(term.backend().sets.get(), 4);
    }

    #[test]
    fn raw_mode_restored_on_eof() {
        let mut term = Terminal::new(Recording::new());
        let mut ed = test_editor(b"abc");
        assert_eq!(ed.read_line(&mut term, &History::new()).unwrap(), ReadOutcome::Eof);
        assert!(term.backend().is_cooked());
        assert_eq!(term.backend().sets.get(), 2);
    }
}
