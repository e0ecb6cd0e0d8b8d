//! Indent-aware text builder for generated shader code.
//!
//! Scopes are guards: [`IndentScope`] and [`BlockScope`] borrow the builder,
//! deref to it, and write the matching dedent / closing brace when dropped, so
//! every opened block is closed on every exit path (including `?`).

use std::ops::{Deref, DerefMut};

const INDENT: &str = "    ";

#[derive(Debug, Default, Clone)]
pub struct ShaderStringBuilder {
    buf: String,
    indent: usize,
}

impl ShaderStringBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(indent: usize) -> Self {
        Self {
            buf: String::new(),
            indent,
        }
    }

    /// Writes one line at the current indentation. An empty line stays empty.
    pub fn append_line(&mut self, line: &str) {
        if !line.is_empty() {
            for _ in 0..self.indent {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(line);
        }
        self.buf.push('\n');
    }

    /// Writes multi-line text, indenting every line.
    pub fn append_lines(&mut self, text: &str) {
        for line in text.lines() {
            self.append_line(line);
        }
    }

    pub fn append_newline(&mut self) {
        self.buf.push('\n');
    }

    pub fn indent(&mut self) -> IndentScope<'_> {
        self.indent += 1;
        IndentScope { sb: self }
    }

    /// `{` ... `}`
    pub fn block_scope(&mut self) -> BlockScope<'_> {
        self.open_block("}")
    }

    /// `{` ... `};` (struct bodies)
    pub fn block_semicolon_scope(&mut self) -> BlockScope<'_> {
        self.open_block("};")
    }

    fn open_block(&mut self, close: &'static str) -> BlockScope<'_> {
        self.append_line("{");
        self.indent += 1;
        BlockScope { sb: self, close }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consumes the builder; a trailing newline is dropped.
    pub fn into_string(mut self) -> String {
        if self.buf.ends_with('\n') {
            self.buf.pop();
        }
        self.buf
    }
}

pub struct IndentScope<'a> {
    sb: &'a mut ShaderStringBuilder,
}

impl Deref for IndentScope<'_> {
    type Target = ShaderStringBuilder;
    fn deref(&self) -> &Self::Target {
        self.sb
    }
}

impl DerefMut for IndentScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.sb
    }
}

impl Drop for IndentScope<'_> {
    fn drop(&mut self) {
        self.sb.indent = self.sb.indent.saturating_sub(1);
    }
}

pub struct BlockScope<'a> {
    sb: &'a mut ShaderStringBuilder,
    close: &'static str,
}

impl Deref for BlockScope<'_> {
    type Target = ShaderStringBuilder;
    fn deref(&self) -> &Self::Target {
        self.sb
    }
}

impl DerefMut for BlockScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.sb
    }
}

impl Drop for BlockScope<'_> {
    fn drop(&mut self) {
        self.sb.indent = self.sb.indent.saturating_sub(1);
        let close = self.close;
        self.sb.append_line(close);
    }
}
