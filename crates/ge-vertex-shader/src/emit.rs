//! Line-oriented GLSL emission sink.
//!
//! Generated text is collected as three ordered line lists (preamble, declarations, entry point
//! body) and serialized once by [`SourceWriter::finish`].

use std::fmt;

/// Pushes one formatted declaration line.
macro_rules! decl {
    ($w:expr, $($arg:tt)*) => {
        $w.decl(format_args!($($arg)*))
    };
}

/// Pushes one formatted statement line into the entry point body.
macro_rules! stmt {
    ($w:expr, $($arg:tt)*) => {
        $w.stmt(format_args!($($arg)*))
    };
}

pub(crate) use {decl, stmt};

const INDENT: &str = "  ";
const ENTRY_OPEN: &str = "void main() {";
const ENTRY_CLOSE: &str = "}";

#[derive(Debug, Default)]
pub(crate) struct SourceWriter {
    preamble: Vec<&'static str>,
    decls: Vec<String>,
    /// `(depth, text)`; depth 0 is the top level of `main`.
    body: Vec<(usize, String)>,
    depth: usize,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preamble(&mut self, line: &'static str) {
        self.preamble.push(line);
    }

    pub fn decl(&mut self, line: fmt::Arguments<'_>) {
        self.decls.push(line.to_string());
    }

    pub fn stmt(&mut self, line: fmt::Arguments<'_>) {
        self.body.push((self.depth, line.to_string()));
    }

    /// Emits `<head> {` and indents what follows.
    pub fn open(&mut self, head: fmt::Arguments<'_>) {
        self.body.push((self.depth, format!("{head} {{")));
        self.depth += 1;
    }

    /// Closes the current block and opens its `else` branch.
    pub fn open_else(&mut self) {
        debug_assert!(self.depth > 0, "else without open block");
        self.body
            .push((self.depth.saturating_sub(1), "} else {".to_owned()));
    }

    pub fn close(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced block close");
        self.depth = self.depth.saturating_sub(1);
        self.body.push((self.depth, "}".to_owned()));
    }

    #[cfg(test)]
    pub fn decl_lines(&self) -> &[String] {
        &self.decls
    }

    /// Bytes [`Self::finish`] will produce.
    pub fn byte_len(&self) -> usize {
        let preamble: usize = self.preamble.iter().map(|l| l.len() + 1).sum();
        let decls: usize = self.decls.iter().map(|l| l.len() + 1).sum();
        let body: usize = self
            .body
            .iter()
            .map(|(depth, l)| (depth + 1) * INDENT.len() + l.len() + 1)
            .sum();
        preamble + decls + body + ENTRY_OPEN.len() + ENTRY_CLOSE.len() + 2
    }

    pub fn finish(self) -> String {
        debug_assert_eq!(self.depth, 0, "unclosed block at end of entry point");
        let mut out = String::with_capacity(self.byte_len());
        for line in &self.preamble {
            out.push_str(line);
            out.push('\n');
        }
        for line in &self.decls {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(ENTRY_OPEN);
        out.push('\n');
        for (depth, line) in &self.body {
            for _ in 0..=*depth {
                out.push_str(INDENT);
            }
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(ENTRY_CLOSE);
        out.push('\n');
        out
    }
}
