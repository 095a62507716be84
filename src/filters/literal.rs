//! Scanner for the list literals stored inside database columns.
//!
//! Values such as `(('EFI-variables'%.'data'))` are serialized association
//! lists. Grammar:
//!
//! ```text
//! list   := '(' item* ')'
//! item   := list | string | '%.' | raw
//! string := quote(d) char* quote(d)
//! ```
//!
//! `quote(d)` is a single quote preceded by exactly `2^d - 1` backslashes, so
//! a literal serialized inside another literal uses `\'`, one nested twice
//! uses `\\\'`, and so on. A backslash followed by any character is a literal
//! pair. Unbalanced parentheses and unterminated strings are kept as raw
//! text. Nothing in here fails: the worst case is that no pair is found.
//!
//! Redaction only rewrites the byte range of a value string, so delimiters,
//! quoting and escaping around it stay exactly as they were in the input.

use std::ops::Range;

/// Nested lists deeper than this are treated as raw text
const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    List(Vec<Node>),
    Str { depth: u32, content: Range<usize> },
    Sep,
    Raw { blank: bool },
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Scanner<'a> {
    fn new(bytes: &'a [u8], span: Range<usize>) -> Self {
        Self {
            bytes,
            pos: span.start,
            end: span.end,
        }
    }

    fn parse(mut self) -> Vec<Node> {
        let mut nodes = Vec::new();
        while self.pos < self.end {
            if self.bytes[self.pos] == b')' {
                // Stray close at the top level
                self.pos += 1;
                nodes.push(Node::Raw { blank: false });
                continue;
            }
            nodes.push(self.item(0));
        }
        nodes
    }

    fn item(&mut self, nesting: usize) -> Node {
        let c = self.bytes[self.pos];
        if c == b'(' && nesting < MAX_NESTING {
            self.pos += 1;
            return Node::List(self.list(nesting + 1));
        }
        if c == b'%' && self.peek(1) == Some(b'.') {
            self.pos += 2;
            return Node::Sep;
        }
        if c == b'\\' || c == b'\'' {
            let run = self.backslash_run(self.pos);
            if let Some(depth) = self.quote_depth(self.pos, run) {
                let open_len = run + 1;
                if let Some(close) = self.closing_quote(self.pos + open_len, run) {
                    let content = self.pos + open_len..close;
                    self.pos = close + open_len;
                    return Node::Str { depth, content };
                }
            }
            // Escape pair, stray quote or unterminated string
            self.pos = (self.pos + run + 1).min(self.end);
            return Node::Raw { blank: false };
        }
        self.pos += 1;
        Node::Raw {
            blank: c.is_ascii_whitespace(),
        }
    }

    fn list(&mut self, nesting: usize) -> Vec<Node> {
        let mut items = Vec::new();
        while self.pos < self.end {
            if self.bytes[self.pos] == b')' {
                self.pos += 1;
                return items;
            }
            items.push(self.item(nesting));
        }
        // Unterminated list: everything up to the end belongs to it
        items
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        let at = self.pos + offset;
        (at < self.end).then(|| self.bytes[at])
    }

    fn backslash_run(&self, from: usize) -> usize {
        self.bytes[from..self.end]
            .iter()
            .take_while(|&&b| b == b'\\')
            .count()
    }

    /// Depth of the quote formed by `run` backslashes at `at`, if any
    fn quote_depth(&self, at: usize, run: usize) -> Option<u32> {
        let quote_at = at + run;
        if quote_at >= self.end || self.bytes[quote_at] != b'\'' {
            return None;
        }
        let width = run + 1;
        width.is_power_of_two().then(|| width.trailing_zeros())
    }

    /// Position of the quote closing a string whose quotes carry `run` backslashes
    fn closing_quote(&self, from: usize, run: usize) -> Option<usize> {
        let mut j = from;
        while j < self.end {
            match self.bytes[j] {
                b'\\' | b'\'' => {
                    let n = self.backslash_run(j);
                    let quote_at = j + n;
                    if n == run && quote_at < self.end && self.bytes[quote_at] == b'\'' {
                        return Some(j);
                    }
                    j = quote_at + 1;
                }
                _ => j += 1,
            }
        }
        None
    }
}

/// Collect the value ranges paired with any of `keys`.
///
/// Strings picked as values are not scanned further; every other string is
/// scanned recursively for deeper pairs.
fn collect(bytes: &[u8], nodes: &[Node], keys: &[String], out: &mut Vec<Range<usize>>) {
    let significant: Vec<&Node> = nodes
        .iter()
        .filter(|node| !matches!(node, Node::Raw { blank: true }))
        .collect();

    let mut picked: Vec<&Range<usize>> = Vec::new();
    for window in significant.windows(3) {
        if let [Node::Str { depth: kd, content: key }, Node::Sep, Node::Str { depth: vd, content: value }] =
            window
        {
            let key_bytes = &bytes[key.clone()];
            if kd == vd && keys.iter().any(|k| k.as_bytes() == key_bytes) {
                out.push(value.clone());
                picked.push(value);
            }
        }
    }

    for node in nodes {
        match node {
            Node::List(children) => collect(bytes, children, keys, out),
            Node::Str { content, .. } if !picked.contains(&content) => {
                let inner = Scanner::new(bytes, content.clone()).parse();
                collect(bytes, &inner, keys, out);
            }
            _ => {}
        }
    }
}

/// Byte ranges of every value paired with one of `keys`, in input order
pub fn find_values(input: &str, keys: &[String]) -> Vec<Range<usize>> {
    let bytes = input.as_bytes();
    let nodes = Scanner::new(bytes, 0..bytes.len()).parse();
    let mut ranges = Vec::new();
    collect(bytes, &nodes, keys, &mut ranges);
    ranges.sort_by_key(|r| r.start);
    ranges
}

/// Replace every value paired with one of `keys` by `marker`
pub fn redact_pairs(input: &str, keys: &[String], marker: &str) -> String {
    let ranges = find_values(input, keys);
    if ranges.is_empty() {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for range in ranges {
        if range.start < last {
            continue;
        }
        out.push_str(&input[last..range.start]);
        out.push_str(marker);
        last = range.end;
    }
    out.push_str(&input[last..]);
    out
}
