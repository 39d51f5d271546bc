//! TypeScript Transpiler
//!
//! Converts TypeScript to JavaScript by stripping types and rewriting the few
//! constructs that have runtime meaning (enums, constructor parameter
//! properties). Every newline of the input survives, so line numbers in
//! interpreter errors still point at the learner's source.

use unicode_xid::UnicodeXID;

use crate::error::{Error, Result};

/// Words that cannot be a value, so a `!`, `<` or `as` after them is not TypeScript.
const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "finally", "for", "function", "if", "import", "in",
    "instanceof", "let", "new", "return", "switch", "throw", "try", "typeof", "var", "void",
    "while", "with", "yield", "await", "of",
];

/// Words after which an operand (not an operator) follows.
const EXPR_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await", "default",
];

const MEMBER_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "override"];

const DECLARE_TARGETS: &[&str] = &[
    "const", "let", "var", "function", "class", "enum", "module", "namespace", "global", "type",
    "interface", "abstract", "async",
];

/// TypeScript to JavaScript transpiler
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptTranspiler;

impl TypeScriptTranspiler {
    pub fn new() -> Self {
        Self
    }

    /// Transpile TypeScript source code to JavaScript
    pub fn transpile(&self, source: &str) -> Result<String> {
        Stripper::new(source).run()
    }
}

// ---------------------------------------------------------------------------
// Scanner state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Block,
    ClassBody,
    Object,
    Paren,
    Params,
    Bracket,
    Template,
    ImportBraces,
}

/// Where a frame is inside a declaration: before the name's annotation, in an
/// initializer, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decl {
    None,
    Name,
    Init,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    decl: Decl,
    ternary: usize,
    /// Output offset of a function or method declaration whose parameter list
    /// this is; a signature without a body is cut back to here.
    fn_start: Option<usize>,
    ctor: bool,
    prop_next: bool,
    extends: bool,
    member_out: usize,
    /// Constructor parameter properties waiting to be assigned.
    props: Vec<String>,
}

impl Frame {
    fn new(kind: FrameKind, out: usize) -> Self {
        Self {
            kind,
            decl: if kind == FrameKind::Params { Decl::Name } else { Decl::None },
            ternary: 0,
            fn_start: None,
            ctor: false,
            prop_next: false,
            extends: false,
            member_out: out,
            props: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Prev {
    Start,
    Word(String),
    Value,
    CloseParen,
    CloseParams,
    Op(char),
    Arrow,
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeMode {
    /// `x: T` in a declaration, parameter or member
    Annotation,
    /// `(...): T` where `=>` belongs to an arrow function
    Return,
    /// right-hand side of a `type` alias
    Alias,
}

fn is_ident_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_xid_start()
}

fn is_ident_part(c: char) -> bool {
    c == '$' || c == '\u{200c}' || c == '\u{200d}' || c.is_xid_continue()
}

fn is_value_word(word: &str) -> bool {
    !RESERVED.contains(&word)
}

struct Stripper {
    chars: Vec<char>,
    pos: usize,
    out: String,
    frames: Vec<Frame>,
    prev: Prev,
    newline_before: bool,
    pending_function: Option<Option<usize>>,
    /// `Some(extends)` between `class` and its body
    pending_class: Option<bool>,
    pending_import: bool,
    pending_ctor_props: Option<Vec<String>>,
    stmt_out: usize,
    stmt_prefix: bool,
}

impl Stripper {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            out: String::with_capacity(source.len()),
            frames: vec![Frame::new(FrameKind::Block, 0)],
            prev: Prev::Start,
            newline_before: false,
            pending_function: None,
            pending_class: None,
            pending_import: false,
            pending_ctor_props: None,
            stmt_out: 0,
            stmt_prefix: false,
        }
    }

    fn run(mut self) -> Result<String> {
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            match c {
                c if c.is_whitespace() => self.whitespace(c),
                '/' => self.slash(),
                '\'' | '"' => {
                    let end = self.skip_string(self.pos);
                    self.copy_to(end);
                    self.token(Prev::Value);
                }
                '`' => {
                    self.emit_char();
                    self.template_chunk();
                }
                '{' => self.open_brace(),
                '}' => self.close_brace(),
                '(' => self.open_paren(),
                ')' => self.close_paren(),
                '[' => self.open_bracket(),
                ']' => {
                    self.pop_frame();
                    self.emit_char();
                    self.token(Prev::Value);
                }
                ',' => self.comma(),
                ';' => self.semicolon(),
                ':' => self.colon(),
                '?' => self.question(),
                '!' => self.bang(),
                '=' => self.equals(),
                '<' => self.less_than(),
                '.' => self.dot(),
                '#' if self.pos == 0 && self.at(1) == '!' => {
                    let end = self.line_end(self.pos);
                    self.copy_to(end);
                }
                '#' => {
                    let end = self.word_at(self.pos + 1).map(|(_, e)| e).unwrap_or(self.pos + 1);
                    let text: String = self.chars[self.pos..end].iter().collect();
                    self.copy_to(end);
                    self.member_name_seen();
                    self.token(Prev::Word(text));
                }
                c if c.is_ascii_digit() => {
                    let end = self.number_end(self.pos);
                    self.copy_to(end);
                    self.token(Prev::Value);
                }
                c if is_ident_start(c) || c == '\\' => self.word()?,
                '+' | '-' if self.at(1) == c => {
                    let value = self.value_like();
                    self.emit_char();
                    self.emit_char();
                    self.token(if value { Prev::Value } else { Prev::Op(c) });
                }
                _ => {
                    self.emit_char();
                    self.token(Prev::Op(c));
                }
            }
        }
        Ok(self.out)
    }

    // ---- Character access ----

    fn at(&self, offset: usize) -> char {
        self.char_at(self.pos + offset)
    }

    fn char_at(&self, i: usize) -> char {
        self.chars.get(i).copied().unwrap_or('\0')
    }

    fn emit_char(&mut self) {
        if let Some(&c) = self.chars.get(self.pos) {
            self.out.push(c);
            self.pos += 1;
        }
    }

    fn copy_to(&mut self, end: usize) {
        let end = end.min(self.chars.len());
        while self.pos < end {
            self.out.push(self.chars[self.pos]);
            self.pos += 1;
        }
    }

    /// Skip source up to `end`, keeping its newlines.
    fn drop_to(&mut self, end: usize) {
        let end = end.min(self.chars.len());
        while self.pos < end {
            if self.chars[self.pos] == '\n' {
                self.out.push('\n');
                self.newline_before = true;
            }
            self.pos += 1;
        }
    }

    /// Cut output back to `start`, keeping its newlines.
    fn truncate_out(&mut self, start: usize) {
        if start > self.out.len() {
            return;
        }
        let newlines = self.out[start..].matches('\n').count();
        self.out.truncate(start);
        self.out.extend(std::iter::repeat('\n').take(newlines));
    }

    fn token(&mut self, prev: Prev) {
        self.prev = prev;
        self.newline_before = false;
    }

    fn top(&self) -> &Frame {
        // the root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn pop_frame(&mut self) -> Option<Frame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    fn expects_operand(&self) -> bool {
        match &self.prev {
            Prev::Start | Prev::Op(_) | Prev::Arrow | Prev::Label => true,
            Prev::Word(w) => EXPR_KEYWORDS.contains(&w.as_str()),
            _ => false,
        }
    }

    fn value_like(&self) -> bool {
        match &self.prev {
            Prev::Value | Prev::CloseParen => true,
            Prev::Word(w) => is_value_word(w),
            _ => false,
        }
    }

    fn at_statement_start(&self) -> bool {
        match &self.prev {
            Prev::Start | Prev::Label => true,
            Prev::Value | Prev::CloseParen | Prev::Word(_) if self.newline_before => {
                self.top().kind == FrameKind::Block && self.value_like()
            }
            _ => false,
        }
    }

    // ---- Lexical skipping (no output) ----

    fn word_at(&self, i: usize) -> Option<(String, usize)> {
        if !is_ident_start(self.char_at(i)) {
            return None;
        }
        let mut end = i + 1;
        while end < self.chars.len() && is_ident_part(self.chars[end]) {
            end += 1;
        }
        Some((self.chars[i..end].iter().collect(), end))
    }

    fn next_word(&self, i: usize) -> Option<(String, usize)> {
        self.word_at(self.skip_trivia(i))
    }

    fn line_end(&self, mut i: usize) -> usize {
        while i < self.chars.len() && self.chars[i] != '\n' {
            i += 1;
        }
        i
    }

    fn comment_end(&self, i: usize) -> Option<usize> {
        if self.char_at(i) != '/' {
            return None;
        }
        match self.char_at(i + 1) {
            '/' => Some(self.line_end(i)),
            '*' => {
                let mut j = i + 2;
                while j < self.chars.len() {
                    if self.chars[j] == '*' && self.char_at(j + 1) == '/' {
                        return Some(j + 2);
                    }
                    j += 1;
                }
                Some(self.chars.len())
            }
            _ => None,
        }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&self, mut i: usize) -> usize {
        loop {
            while i < self.chars.len() && self.chars[i].is_whitespace() {
                i += 1;
            }
            match self.comment_end(i) {
                Some(end) => i = end,
                None => return i,
            }
        }
    }

    fn skip_inline_ws(&self, mut i: usize) -> usize {
        while i < self.chars.len() && self.chars[i] != '\n' && self.chars[i].is_whitespace() {
            i += 1;
        }
        i
    }

    fn skip_string(&self, i: usize) -> usize {
        let quote = self.char_at(i);
        let mut j = i + 1;
        while j < self.chars.len() {
            match self.chars[j] {
                '\\' => j += 2,
                '\n' => return j,
                c if c == quote => return j + 1,
                _ => j += 1,
            }
        }
        self.chars.len()
    }

    fn skip_template(&self, i: usize) -> usize {
        let mut j = i + 1;
        while j < self.chars.len() {
            match self.chars[j] {
                '\\' => j += 2,
                '`' => return j + 1,
                '$' if self.char_at(j + 1) == '{' => match self.matching(j + 1, '{', '}') {
                    Some(end) => j = end,
                    None => return self.chars.len(),
                },
                _ => j += 1,
            }
        }
        self.chars.len()
    }

    fn number_end(&self, i: usize) -> usize {
        let hex = self.char_at(i) == '0' && matches!(self.char_at(i + 1), 'x' | 'X');
        let mut j = i;
        while j < self.chars.len() {
            let c = self.chars[j];
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                j += 1;
            } else if (c == '+' || c == '-') && !hex && matches!(self.char_at(j - 1), 'e' | 'E') {
                j += 1;
            } else {
                break;
            }
        }
        j
    }

    /// Index after the delimiter closing the one at `i`.
    fn matching(&self, i: usize, open: char, close: char) -> Option<usize> {
        if self.char_at(i) != open {
            return None;
        }
        let mut depth = 0usize;
        let mut j = i;
        while j < self.chars.len() {
            let c = self.chars[j];
            if let Some(end) = self.comment_end(j) {
                j = end;
                continue;
            }
            match c {
                '\'' | '"' => {
                    j = self.skip_string(j);
                    continue;
                }
                '`' => {
                    j = self.skip_template(j);
                    continue;
                }
                c if c == open => depth += 1,
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(j + 1);
                    }
                }
                _ => {}
            }
            j += 1;
        }
        None
    }

    /// Index after the `>` closing the `<` at `i`. With `strict`, give up on
    /// anything that reads like an expression (`a < b && c > d`).
    fn angle_end(&self, i: usize, strict: bool) -> Option<usize> {
        let mut depth = 0usize;
        let mut j = i;
        while j < self.chars.len() {
            let c = self.chars[j];
            let next = self.char_at(j + 1);
            match c {
                '<' => depth += 1,
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        if strict && next == '=' {
                            return None;
                        }
                        return Some(j + 1);
                    }
                }
                '=' if next == '>' => j += 1,
                '(' | '[' | '{' => {
                    let close = match c {
                        '(' => ')',
                        '[' => ']',
                        _ => '}',
                    };
                    j = self.matching(j, c, close)?;
                    continue;
                }
                '\'' | '"' => {
                    j = self.skip_string(j);
                    continue;
                }
                ';' | ')' | ']' | '}' => return None,
                '&' | '|' if strict && next == c => return None,
                '+' | '*' | '/' | '%' | '!' | '=' if strict => return None,
                _ => {}
            }
            j += 1;
        }
        None
    }

    /// End of a statement starting at `i`: after its `;`, or at the newline or
    /// closing delimiter that ends it.
    fn statement_end(&self, mut i: usize) -> usize {
        let mut depth = 0usize;
        while i < self.chars.len() {
            if let Some(end) = self.comment_end(i) {
                i = end;
                continue;
            }
            match self.chars[i] {
                '\'' | '"' => {
                    i = self.skip_string(i);
                    continue;
                }
                '`' => {
                    i = self.skip_template(i);
                    continue;
                }
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => {
                    if depth == 0 {
                        return i;
                    }
                    depth -= 1;
                }
                ';' if depth == 0 => return i + 1,
                '\n' if depth == 0 => return i,
                _ => {}
            }
            i += 1;
        }
        self.chars.len()
    }

    /// End of the type expression starting at `start`.
    fn type_end(&self, start: usize, mode: TypeMode) -> usize {
        let mut i = start;
        let mut end = start;
        let mut expect = true;
        let mut group = false;

        loop {
            let before = i;
            i = self.skip_trivia(i);
            let crossed = self.chars[before.min(self.chars.len())..i.min(self.chars.len())]
                .contains(&'\n');
            let c = self.char_at(i);
            if c == '\0' || (crossed && !expect && c != '|' && c != '&') {
                break;
            }
            let next = self.char_at(i + 1);

            match c {
                '|' | '&' => {
                    if next == c {
                        break;
                    }
                    i += 1;
                    expect = true;
                }
                '(' if expect => match self.matching(i, '(', ')') {
                    Some(e) => {
                        i = e;
                        expect = false;
                        group = true;
                        end = i;
                        continue;
                    }
                    None => break,
                },
                '[' => match self.matching(i, '[', ']') {
                    Some(e) => {
                        i = e;
                        expect = false;
                    }
                    None => break,
                },
                '{' if expect => match self.matching(i, '{', '}') {
                    Some(e) => {
                        i = e;
                        expect = false;
                    }
                    None => break,
                },
                '<' => match self.angle_end(i, false) {
                    Some(e) => i = e,
                    None => break,
                },
                '=' if next == '>' => {
                    if mode == TypeMode::Return || expect || !group {
                        break;
                    }
                    i += 2;
                    expect = true;
                }
                '.' if next == '.' && self.char_at(i + 2) == '.' => {
                    i += 3;
                    expect = true;
                }
                '.' if !expect => {
                    i += 1;
                    expect = true;
                }
                '?' | ':' if mode == TypeMode::Alias && !expect => {
                    i += 1;
                    expect = true;
                }
                '\'' | '"' if expect => {
                    i = self.skip_string(i);
                    expect = false;
                }
                '`' if expect => {
                    i = self.skip_template(i);
                    expect = false;
                }
                '-' if expect && next.is_ascii_digit() => {
                    i = self.number_end(i + 1);
                    expect = false;
                }
                c if expect && c.is_ascii_digit() => {
                    i = self.number_end(i);
                    expect = false;
                }
                c if is_ident_start(c) => {
                    let Some((word, e)) = self.word_at(i) else { break };
                    if expect {
                        expect = matches!(
                            word.as_str(),
                            "keyof" | "typeof" | "readonly" | "unique" | "infer" | "new" | "asserts" | "abstract"
                        );
                    } else if word == "is" || (mode == TypeMode::Alias && word == "extends") {
                        expect = true;
                    } else {
                        break;
                    }
                    i = e;
                }
                _ => break,
            }
            group = false;
            end = i;
        }
        end
    }

    /// Does the `(` at `i` open an arrow function's parameter list?
    fn is_arrow_params(&self, i: usize) -> bool {
        let Some(close) = self.matching(i, '(', ')') else {
            return false;
        };
        let mut j = self.skip_trivia(close);
        if self.char_at(j) == ':' && self.char_at(j + 1) != ':' {
            let start = self.skip_trivia(j + 1);
            j = self.skip_trivia(self.type_end(start, TypeMode::Return));
        }
        self.char_at(j) == '=' && self.char_at(j + 1) == '>'
    }
}

// ---------------------------------------------------------------------------
// Punctuation
// ---------------------------------------------------------------------------

impl Stripper {
    fn whitespace(&mut self, c: char) {
        self.emit_char();
        if c != '\n' {
            return;
        }
        self.newline_before = true;

        let value = self.value_like();
        let out = self.out.len();
        let top = self.top_mut();
        if value && top.ternary == 0 && top.decl != Decl::None {
            match top.kind {
                FrameKind::ClassBody => {
                    top.decl = Decl::None;
                    top.member_out = out;
                }
                FrameKind::Block => top.decl = Decl::None,
                _ => {}
            }
        }
    }

    fn slash(&mut self) {
        if let Some(end) = self.comment_end(self.pos) {
            let newline = self.chars[self.pos..end].contains(&'\n');
            self.copy_to(end);
            self.newline_before |= newline;
            return;
        }
        if !self.expects_operand() {
            self.emit_char();
            self.token(Prev::Op('/'));
            return;
        }

        // regular expression literal
        let mut j = self.pos + 1;
        let mut class = false;
        while j < self.chars.len() {
            match self.chars[j] {
                '\\' => j += 1,
                '[' => class = true,
                ']' => class = false,
                '/' if !class => break,
                '\n' => break,
                _ => {}
            }
            j += 1;
        }
        j += 1;
        while j < self.chars.len() && is_ident_part(self.chars[j]) {
            j += 1;
        }
        self.copy_to(j);
        self.token(Prev::Value);
    }

    /// Copy template text up to the closing backtick or the next `${`.
    fn template_chunk(&mut self) {
        while self.pos < self.chars.len() {
            match self.chars[self.pos] {
                '\\' => {
                    self.emit_char();
                    self.emit_char();
                }
                '`' => {
                    self.emit_char();
                    self.token(Prev::Value);
                    return;
                }
                '$' if self.at(1) == '{' => {
                    self.emit_char();
                    self.emit_char();
                    let frame = Frame::new(FrameKind::Template, self.out.len());
                    self.frames.push(frame);
                    self.token(Prev::Op('{'));
                    return;
                }
                _ => self.emit_char(),
            }
        }
        self.token(Prev::Value);
    }

    fn open_brace(&mut self) {
        self.emit_char();
        let mut extends = false;

        let kind = if let Some(ext) = self.pending_class.take() {
            extends = ext;
            FrameKind::ClassBody
        } else if std::mem::take(&mut self.pending_import) {
            FrameKind::ImportBraces
        } else if self.top().kind == FrameKind::ClassBody {
            FrameKind::Block
        } else {
            match &self.prev {
                Prev::CloseParams | Prev::CloseParen | Prev::Arrow | Prev::Label | Prev::Start => {
                    FrameKind::Block
                }
                Prev::Word(w) if matches!(w.as_str(), "else" | "try" | "finally" | "do") => {
                    FrameKind::Block
                }
                Prev::Word(w) if matches!(w.as_str(), "let" | "const" | "var") => FrameKind::Object,
                _ if self.expects_operand() => FrameKind::Object,
                _ => FrameKind::Block,
            }
        };

        let mut frame = Frame::new(kind, self.out.len());
        frame.extends = extends;

        if kind == FrameKind::Block && self.prev == Prev::CloseParams {
            if let Some(props) = self.pending_ctor_props.take() {
                if self.top().kind == FrameKind::ClassBody && self.top().extends {
                    frame.props = props;
                } else {
                    self.out.push_str(&assignments(&props));
                }
            }
        }
        self.pending_ctor_props = None;
        self.frames.push(frame);

        match kind {
            FrameKind::Block | FrameKind::ClassBody => self.token(Prev::Start),
            _ => self.token(Prev::Op('{')),
        }
    }

    fn close_brace(&mut self) {
        let frame = self.pop_frame();
        self.emit_char();
        match frame.map(|f| f.kind) {
            Some(FrameKind::Template) => self.template_chunk(),
            Some(FrameKind::Object) | Some(FrameKind::ImportBraces) => self.token(Prev::Value),
            _ => {
                let out = self.out.len();
                let top = self.top_mut();
                if top.kind == FrameKind::ClassBody {
                    top.decl = Decl::None;
                    top.member_out = out;
                }
                self.token(Prev::Start);
            }
        }
    }

    fn open_paren(&mut self) {
        self.pending_import = false;
        let (kind, decl, member_out) = {
            let top = self.top();
            (top.kind, top.decl, top.member_out)
        };
        let out = self.out.len();

        let mut frame = if let Some(start) = self.pending_function.take() {
            let mut frame = Frame::new(FrameKind::Params, out);
            frame.fn_start = start;
            frame
        } else if kind == FrameKind::ClassBody && decl != Decl::Init {
            let mut frame = Frame::new(FrameKind::Params, out);
            frame.fn_start = Some(member_out);
            frame.ctor = self.prev == Prev::Word("constructor".to_string());
            frame
        } else if (kind == FrameKind::Object && decl == Decl::None)
            || self.prev == Prev::Word("catch".to_string())
            || self.is_arrow_params(self.pos)
        {
            Frame::new(FrameKind::Params, out)
        } else {
            Frame::new(FrameKind::Paren, out)
        };

        if frame.kind == FrameKind::Paren && self.prev == Prev::Word("super".to_string()) {
            frame.props = std::mem::take(&mut self.top_mut().props);
        }

        self.emit_char();
        self.frames.push(frame);
        self.token(Prev::Op('('));
    }

    fn close_paren(&mut self) {
        let frame = self.pop_frame();
        self.emit_char();

        let frame = match frame {
            Some(frame) if frame.kind == FrameKind::Params => frame,
            other => {
                if let Some(frame) = other.filter(|f| !f.props.is_empty()) {
                    self.out.push(';');
                    self.out.push_str(&assignments(&frame.props));
                }
                self.token(Prev::CloseParen);
                return;
            }
        };

        self.token(Prev::CloseParams);

        // return type
        let colon = self.skip_trivia(self.pos);
        if self.char_at(colon) == ':' && self.char_at(colon + 1) != ':' {
            let start = self.skip_trivia(colon + 1);
            let end = self.type_end(start, TypeMode::Return);
            self.drop_to(end);
            self.newline_before = false;
        }

        if let Some(start) = frame.fn_start {
            let next = self.skip_trivia(self.pos);
            if self.char_at(next) != '{' {
                // overload or abstract signature
                self.truncate_out(start);
                let end = self.statement_end(self.pos);
                self.drop_to(end);
                let out = self.out.len();
                let top = self.top_mut();
                if top.kind == FrameKind::ClassBody {
                    top.decl = Decl::None;
                    top.member_out = out;
                }
                self.token(Prev::Start);
                return;
            }
        }

        if frame.ctor && !frame.props.is_empty() {
            self.pending_ctor_props = Some(frame.props);
        }
    }

    fn open_bracket(&mut self) {
        let top = self.top();
        if top.kind == FrameKind::ClassBody && top.decl == Decl::None && self.is_index_signature() {
            let end = self.statement_end(self.pos);
            self.drop_to(end);
            return;
        }
        self.emit_char();
        let frame = Frame::new(FrameKind::Bracket, self.out.len());
        self.frames.push(frame);
        self.token(Prev::Op('['));
    }

    /// `[key: string]: T` inside a class body.
    fn is_index_signature(&self) -> bool {
        match self.next_word(self.pos + 1) {
            Some((_, end)) => self.char_at(self.skip_trivia(end)) == ':',
            None => false,
        }
    }

    fn comma(&mut self) {
        self.emit_char();
        let top = self.top_mut();
        match top.kind {
            FrameKind::Params => top.decl = Decl::Name,
            FrameKind::Object => top.decl = Decl::None,
            FrameKind::Block | FrameKind::Paren if top.decl == Decl::Init => top.decl = Decl::Name,
            _ => {}
        }
        self.token(Prev::Op(','));
    }

    fn semicolon(&mut self) {
        self.emit_char();
        self.pending_import = false;
        let out = self.out.len();
        let top = self.top_mut();
        top.decl = Decl::None;
        top.ternary = 0;
        top.member_out = out;
        let kind = top.kind;
        match kind {
            FrameKind::Block | FrameKind::ClassBody => self.token(Prev::Start),
            _ => self.token(Prev::Op(';')),
        }
    }

    fn colon(&mut self) {
        let top = self.top();
        let annotate = match top.kind {
            FrameKind::ClassBody => top.decl == Decl::Name,
            FrameKind::Params | FrameKind::Block | FrameKind::Paren => {
                top.decl == Decl::Name && top.ternary == 0
            }
            _ => false,
        };
        if annotate {
            let start = self.skip_trivia(self.pos + 1);
            let end = self.type_end(start, TypeMode::Annotation);
            self.drop_to(end);
            self.newline_before = false;
            return;
        }

        self.emit_char();
        let top = self.top_mut();
        if top.kind == FrameKind::Object && top.decl == Decl::None {
            top.decl = Decl::Init;
            self.token(Prev::Op(':'));
        } else if top.ternary > 0 {
            top.ternary -= 1;
            self.token(Prev::Op(':'));
        } else if top.kind == FrameKind::Block {
            self.token(Prev::Label);
        } else {
            self.token(Prev::Op(':'));
        }
    }

    fn question(&mut self) {
        let next = self.at(1);
        if next == '.' && !self.at(2).is_ascii_digit() {
            self.emit_char();
            self.emit_char();
            self.token(Prev::Op('.'));
            return;
        }
        if next == '?' {
            self.emit_char();
            self.emit_char();
            if self.at(0) == '=' {
                self.emit_char();
            }
            self.token(Prev::Op('?'));
            return;
        }

        let top = self.top();
        let optional = matches!(
            top.kind,
            FrameKind::Params | FrameKind::ClassBody | FrameKind::Block | FrameKind::Paren
        ) && top.decl == Decl::Name;
        if optional {
            let after = self.skip_trivia(self.pos + 1);
            if matches!(self.char_at(after), ':' | ',' | ')' | '=' | ';' | '(' | '\0')
                || (top.kind == FrameKind::ClassBody && after > self.skip_inline_ws(self.pos + 1))
            {
                self.pos += 1;
                return;
            }
        }

        self.top_mut().ternary += 1;
        self.emit_char();
        self.token(Prev::Op('?'));
    }

    fn bang(&mut self) {
        if self.at(1) == '=' {
            self.emit_char();
            self.emit_char();
            if self.at(0) == '=' {
                self.emit_char();
            }
            self.token(Prev::Op('='));
            return;
        }
        if self.value_like() && !self.newline_before {
            // non-null or definite assignment assertion
            self.pos += 1;
            return;
        }
        self.emit_char();
        self.token(Prev::Op('!'));
    }

    fn equals(&mut self) {
        match self.at(1) {
            '>' => {
                self.emit_char();
                self.emit_char();
                self.token(Prev::Arrow);
            }
            '=' => {
                self.emit_char();
                self.emit_char();
                if self.at(0) == '=' {
                    self.emit_char();
                }
                self.token(Prev::Op('='));
            }
            _ => {
                self.emit_char();
                let top = self.top_mut();
                if top.decl == Decl::Name && top.kind != FrameKind::Object {
                    top.decl = Decl::Init;
                }
                self.token(Prev::Op('='));
            }
        }
    }

    fn less_than(&mut self) {
        let after_word = matches!(&self.prev, Prev::Word(_));
        let strip = if (self.pending_class.is_some() || self.pending_function.is_some()) && after_word {
            self.angle_end(self.pos, false)
        } else if self.value_like() || self.expects_operand() {
            self.angle_end(self.pos, true)
                .filter(|&end| self.char_at(self.skip_trivia(end)) == '(')
        } else {
            None
        };

        if let Some(end) = strip {
            self.drop_to(end);
            self.newline_before = false;
            return;
        }

        self.emit_char();
        while matches!(self.at(0), '<' | '=') {
            self.emit_char();
        }
        self.token(Prev::Op('<'));
    }

    fn dot(&mut self) {
        if self.at(1) == '.' && self.at(2) == '.' {
            self.copy_to(self.pos + 3);
            self.token(Prev::Op('…'));
            return;
        }
        if self.at(1).is_ascii_digit() {
            let end = self.number_end(self.pos);
            self.copy_to(end);
            self.token(Prev::Value);
            return;
        }
        self.pending_import = false;
        self.emit_char();
        self.token(Prev::Op('.'));
    }

    /// A class member's name has been read.
    fn member_name_seen(&mut self) {
        let top = self.top_mut();
        if top.kind == FrameKind::ClassBody && top.decl == Decl::None {
            top.decl = Decl::Name;
        }
    }
}

fn assignments(props: &[String]) -> String {
    props
        .iter()
        .map(|p| format!(" this.{0} = {0};", p))
        .collect()
}

// ---------------------------------------------------------------------------
// Words and declarations
// ---------------------------------------------------------------------------

impl Stripper {
    fn word(&mut self) -> Result<()> {
        let start = self.pos;
        let Some((word, end)) = self.word_at(start) else {
            // unicode escape inside an identifier
            self.emit_char();
            self.token(Prev::Op('\\'));
            return Ok(());
        };

        let after_dot = self.prev == Prev::Op('.');
        if !after_dot && self.at_statement_start() {
            self.stmt_out = self.out.len();
            self.stmt_prefix = true;
        }
        let prefix_ok = self.stmt_prefix;
        self.stmt_prefix =
            prefix_ok && matches!(word.as_str(), "export" | "default" | "async" | "declare");
        let stmt = prefix_ok && self.stmt_out == self.out.len();

        if self.pending_import && self.prev == Prev::Word("export".to_string()) {
            self.pending_import = false;
        }
        if after_dot {
            self.plain_word(word, end);
            return Ok(());
        }

        let (kind, decl, ctor) = {
            let top = self.top();
            (top.kind, top.decl, top.ctor)
        };
        match kind {
            FrameKind::Object if decl == Decl::None => {
                self.plain_word(word, end);
                return Ok(());
            }
            FrameKind::ImportBraces => {
                if word == "type" && matches!(self.prev, Prev::Op('{') | Prev::Op(',')) {
                    if let Some(specifier_end) = self.type_specifier_end(end) {
                        self.drop_to(specifier_end);
                        return Ok(());
                    }
                }
                self.plain_word(word, end);
                return Ok(());
            }
            FrameKind::ClassBody if decl == Decl::None => {
                self.class_member_word(word, end);
                return Ok(());
            }
            FrameKind::Params if ctor => {
                if MEMBER_MODIFIERS.contains(&word.as_str()) {
                    let next = self.skip_inline_ws(end);
                    if is_ident_start(self.char_at(next)) {
                        self.drop_to(next);
                        self.top_mut().prop_next = true;
                        return Ok(());
                    }
                }
                let top = self.top_mut();
                if std::mem::take(&mut top.prop_next) {
                    top.props.push(word.clone());
                }
            }
            _ => {}
        }

        match word.as_str() {
            "interface" if stmt && self.next_word(end).is_some() => {
                let stop = self.interface_end(end, start)?;
                self.drop_statement(stop);
            }
            "type" if stmt => match self.type_alias_end(end) {
                Some(stop) => self.drop_statement(stop),
                None => self.plain_word(word, end),
            },
            "enum" if self.is_enum_head(end) => self.enum_transform(end, start)?,
            "const" if matches!(self.next_word(end), Some((ref w, e)) if w == "enum" && self.is_enum_head(e)) => {
                let enum_end = self.next_word(end).map(|(_, e)| e).unwrap_or(end);
                self.enum_transform(enum_end, start)?;
            }
            "let" | "const" | "var" => {
                self.top_mut().decl = Decl::Name;
                self.plain_word(word, end);
            }
            "declare" if stmt && self.declares(end) => {
                let stop = self.statement_end(self.pos);
                self.drop_statement(stop);
            }
            "abstract" if matches!(self.next_word(end), Some((ref w, _)) if w == "class") => {
                let next = self.skip_trivia(end);
                self.drop_to(next);
            }
            "namespace" | "module" if stmt && self.is_namespace_head(end) => {
                return Err(Error::transpile(
                    "namespace declarations are not supported",
                    start,
                ));
            }
            "export" if stmt => self.export_word(word, end, start)?,
            "import" if self.is_type_import(end) => {
                let stop = self.module_statement_end(end);
                self.drop_statement(stop);
            }
            "import" => {
                self.pending_import = true;
                self.plain_word(word, end);
            }
            "function" => {
                self.pending_function = Some(if prefix_ok { Some(self.stmt_out) } else { None });
                self.plain_word(word, end);
            }
            "class" => {
                self.pending_class = Some(false);
                self.plain_word(word, end);
            }
            "extends" if self.pending_class.is_some() => {
                self.pending_class = Some(true);
                self.plain_word(word, end);
            }
            "implements" if self.pending_class.is_some() => {
                let body = self.body_start(end);
                self.drop_to(body);
            }
            "as" | "satisfies" if self.value_like() => {
                let stop = match self.next_word(end) {
                    Some((w, e)) if w == "const" => e,
                    _ => self.type_end(self.skip_trivia(end), TypeMode::Annotation),
                };
                self.drop_to(stop);
                self.newline_before = false;
            }
            "from" => {
                self.pending_import = false;
                self.plain_word(word, end);
            }
            _ => self.plain_word(word, end),
        }
        Ok(())
    }

    fn plain_word(&mut self, word: String, end: usize) {
        self.copy_to(end);
        self.token(Prev::Word(word));
    }

    /// Drop a whole statement and continue as if it never existed.
    fn drop_statement(&mut self, stop: usize) {
        self.drop_to(stop);
        self.token(Prev::Start);
    }

    fn export_word(&mut self, word: String, end: usize, start: usize) -> Result<()> {
        let next = self.next_word(end);
        let stop = match next.as_ref().map(|(w, e)| (w.as_str(), *e)) {
            Some(("interface", e)) => Some(self.interface_end(e, start)?),
            Some(("type", e)) => {
                let after = self.skip_trivia(e);
                if matches!(self.char_at(after), '{' | '*') {
                    Some(self.statement_end(after))
                } else {
                    self.type_alias_end(e)
                }
            }
            Some(("declare", e)) if self.declares(e) => Some(self.statement_end(e)),
            Some(("default", e)) => match self.next_word(e) {
                Some((w, e2)) if w == "interface" => Some(self.interface_end(e2, start)?),
                _ => None,
            },
            _ => None,
        };

        match stop {
            Some(stop) => self.drop_statement(stop),
            None => {
                self.pending_import = true;
                self.plain_word(word, end);
            }
        }
        Ok(())
    }

    fn class_member_word(&mut self, word: String, end: usize) {
        let next = self.skip_inline_ws(end);
        let c = self.char_at(next);
        let prefixes = is_ident_start(c) || matches!(c, '#' | '[' | '*' | '\'' | '"');

        if prefixes && MEMBER_MODIFIERS.contains(&word.as_str()) {
            self.drop_to(next);
            return;
        }
        match word.as_str() {
            "declare" | "abstract" if prefixes => {
                let stop = self.statement_end(self.pos);
                self.drop_to(stop);
                let out = self.out.len();
                let top = self.top_mut();
                top.decl = Decl::None;
                top.member_out = out;
                self.token(Prev::Start);
            }
            "static" | "async" | "get" | "set" | "accessor" if prefixes || c == '{' => {
                self.plain_word(word, end);
            }
            _ => {
                self.plain_word(word, end);
                self.top_mut().decl = Decl::Name;
            }
        }
    }

    /// `type Name` inside import braces: end of the specifier, its alias and
    /// trailing comma.
    fn type_specifier_end(&self, type_end: usize) -> Option<usize> {
        let (name, mut j) = self.next_word(type_end)?;
        if name == "as" {
            return None;
        }
        if let Some((w, e)) = self.next_word(j) {
            if w == "as" {
                j = self.next_word(e).map(|(_, e)| e).unwrap_or(e);
            }
        }
        let k = self.skip_trivia(j);
        Some(if self.char_at(k) == ',' { k + 1 } else { j })
    }

    /// End of an `interface` declaration whose name starts after `from`.
    fn interface_end(&self, from: usize, start: usize) -> Result<usize> {
        let body = self.body_start(from);
        let end = self
            .matching(body, '{', '}')
            .ok_or_else(|| Error::transpile("expected interface body", start))?;
        let k = self.skip_inline_ws(end);
        Ok(if self.char_at(k) == ';' { k + 1 } else { end })
    }

    /// Index of the `{` opening the body of a class or interface head.
    fn body_start(&self, mut i: usize) -> usize {
        while i < self.chars.len() {
            i = self.skip_trivia(i);
            match self.char_at(i) {
                '{' | '\0' => return i,
                '<' => i = self.angle_end(i, false).unwrap_or(i + 1),
                '\'' | '"' => i = self.skip_string(i),
                _ => i += 1,
            }
        }
        self.chars.len()
    }

    /// `type Name<...> = ...;` after the `type` keyword, or `None` when `type`
    /// is just an identifier.
    fn type_alias_end(&self, from: usize) -> Option<usize> {
        let (_, name_end) = self.next_word(from)?;
        let mut j = self.skip_trivia(name_end);
        if self.char_at(j) == '<' {
            j = self.skip_trivia(self.angle_end(j, false)?);
        }
        if self.char_at(j) != '=' || self.char_at(j + 1) == '=' {
            return None;
        }
        let end = self.type_end(self.skip_trivia(j + 1), TypeMode::Alias);
        let k = self.skip_inline_ws(end);
        Some(if self.char_at(k) == ';' { k + 1 } else { end })
    }

    fn is_enum_head(&self, from: usize) -> bool {
        match self.next_word(from) {
            Some((_, e)) => self.char_at(self.skip_trivia(e)) == '{',
            None => false,
        }
    }

    fn is_namespace_head(&self, from: usize) -> bool {
        let i = self.skip_inline_ws(from);
        let name_end = match self.char_at(i) {
            '\'' | '"' => self.skip_string(i),
            c if is_ident_start(c) => match self.word_at(i) {
                Some((_, e)) => e,
                None => return false,
            },
            _ => return false,
        };
        matches!(self.char_at(self.skip_trivia(name_end)), '{' | '.')
    }

    /// Is `declare` at `from` followed by a declaration on the same line?
    fn declares(&self, from: usize) -> bool {
        let i = self.skip_inline_ws(from);
        match self.word_at(i) {
            Some((w, _)) => DECLARE_TARGETS.contains(&w.as_str()),
            None => false,
        }
    }

    /// `import type X from`, `import type { X } from` or `import type * as X from`.
    fn is_type_import(&self, from: usize) -> bool {
        let Some((w, e)) = self.next_word(from) else {
            return false;
        };
        if w != "type" {
            return false;
        }
        let after = self.skip_trivia(e);
        match self.word_at(after) {
            Some((name, _)) => name != "from",
            None => matches!(self.char_at(after), '{' | '*'),
        }
    }

    /// End of an import or export statement: after its module specifier and
    /// optional `;`.
    fn module_statement_end(&self, mut i: usize) -> usize {
        while i < self.chars.len() {
            i = self.skip_trivia(i);
            match self.char_at(i) {
                '\'' | '"' => {
                    let end = self.skip_string(i);
                    let k = self.skip_inline_ws(end);
                    return if self.char_at(k) == ';' { k + 1 } else { end };
                }
                '{' => i = self.matching(i, '{', '}').unwrap_or(self.chars.len()),
                ';' => return i + 1,
                _ => i += 1,
            }
        }
        self.chars.len()
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

enum AutoValue {
    Number(i64),
    After(String),
}

impl Stripper {
    /// Rewrite `enum Name { ... }` into a `var` plus an initializing IIFE on
    /// one line, padded with the newlines the declaration spanned.
    fn enum_transform(&mut self, keyword_end: usize, start: usize) -> Result<()> {
        let (name, name_end) = self
            .next_word(keyword_end)
            .ok_or_else(|| Error::transpile("expected enum name", start))?;
        let open = self.skip_trivia(name_end);
        if self.char_at(open) != '{' {
            return Err(Error::transpile("expected '{' after enum name", start));
        }

        let mut members: Vec<(String, Option<String>)> = Vec::new();
        let mut i = open + 1;
        loop {
            i = self.skip_trivia(i);
            let (key, key_end) = match self.char_at(i) {
                '}' => {
                    i += 1;
                    break;
                }
                ',' => {
                    i += 1;
                    continue;
                }
                '\0' => return Err(Error::transpile("unterminated enum body", start)),
                '\'' | '"' => {
                    let end = self.skip_string(i);
                    let inner: String =
                        self.chars[i + 1..end.saturating_sub(1).max(i + 1)].iter().collect();
                    (inner, end)
                }
                c if is_ident_start(c) => self
                    .word_at(i)
                    .ok_or_else(|| Error::transpile("invalid enum member", i))?,
                _ => return Err(Error::transpile("invalid enum member", i)),
            };

            let j = self.skip_trivia(key_end);
            if self.char_at(j) == '=' {
                let (expr, end) = self.enum_initializer(j + 1, start)?;
                members.push((key, Some(expr)));
                i = end;
            } else {
                members.push((key, None));
                i = j;
            }
        }

        let mut js = format!("var {0}; (function ({0}) {{", name);
        let mut auto = AutoValue::Number(0);
        for (key, init) in &members {
            let quoted = serde_json::to_string(key)?;
            match init {
                Some(expr) if expr.starts_with(['"', '\'', '`']) => {
                    js.push_str(&format!(" {}[{}] = {};", name, quoted, expr));
                    auto = AutoValue::After(quoted);
                    continue;
                }
                Some(expr) => {
                    js.push_str(&format!(" {0}[{0}[{1}] = {2}] = {1};", name, quoted, expr));
                    auto = match expr.parse::<i64>() {
                        Ok(n) => AutoValue::Number(n + 1),
                        Err(_) => AutoValue::After(quoted),
                    };
                }
                None => {
                    let value = match &auto {
                        AutoValue::Number(n) => n.to_string(),
                        AutoValue::After(prev) => format!("{}[{}] + 1", name, prev),
                    };
                    js.push_str(&format!(" {0}[{0}[{1}] = {2}] = {1};", name, quoted, value));
                    auto = match auto {
                        AutoValue::Number(n) => AutoValue::Number(n + 1),
                        AutoValue::After(_) => AutoValue::After(quoted),
                    };
                }
            }
        }
        js.push_str(&format!(" }})({0} || ({0} = {{}}));", name));

        let spanned = self.chars[self.pos..i].iter().filter(|&&c| c == '\n').count();
        let emitted = js.matches('\n').count();
        self.out.push_str(&js);
        self.out.extend(std::iter::repeat('\n').take(spanned.saturating_sub(emitted)));
        self.pos = i;
        self.token(Prev::Start);
        tracing::trace!(name = %name, members = members.len(), "rewrote enum");
        Ok(())
    }

    /// Text of a member initializer, up to the `,` or `}` ending it.
    fn enum_initializer(&self, from: usize, start: usize) -> Result<(String, usize)> {
        let mut depth = 0usize;
        let mut i = from;
        while i < self.chars.len() {
            if let Some(end) = self.comment_end(i) {
                i = end;
                continue;
            }
            match self.chars[i] {
                '\'' | '"' => {
                    i = self.skip_string(i);
                    continue;
                }
                '`' => {
                    i = self.skip_template(i);
                    continue;
                }
                '(' | '[' | '{' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                '}' if depth > 0 => depth -= 1,
                ',' | '}' if depth == 0 => {
                    let text: String = self.chars[from..i].iter().collect();
                    return Ok((text.trim().to_string(), i));
                }
                _ => {}
            }
            i += 1;
        }
        Err(Error::transpile("unterminated enum body", start))
    }
}
