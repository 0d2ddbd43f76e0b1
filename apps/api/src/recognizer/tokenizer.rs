//! Whitespace tokenizer with punctuation peeling, shared by documents and phrase patterns.

/// Characters split off the front of a word.
const PREFIXES: &[char] = &['(', '[', '{', '<', '"', '\'', '*', '•', '·', '“', '‘', '«'];

/// Characters split off the end of a word.
const SUFFIXES: &[char] = &[
    ')', ']', '}', '>', '"', '\'', ',', ';', ':', '!', '?', '.', '”', '’', '»',
];

/// Characters that split a word in two and become tokens of their own.
/// `.` is not among them, so dotted names such as `ASP.NET` stay whole.
const INFIXES: &[char] = &['/', ','];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub lower: String,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl<'a> Token<'a> {
    fn new(source: &'a str, start: usize, end: usize) -> Self {
        let text = &source[start..end];
        Self {
            text,
            lower: text.to_lowercase(),
            start,
            end,
        }
    }
}

/// Splits `text` into tokens. Offsets index into `text`, so any run of tokens
/// maps back to an exact source slice.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(start) = word_start.take() {
                split_word(text, start, i, &mut tokens);
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(start) = word_start {
        split_word(text, start, text.len(), &mut tokens);
    }

    tokens
}

fn split_word<'a>(source: &'a str, mut start: usize, mut end: usize, out: &mut Vec<Token<'a>>) {
    while let Some(c) = source[start..end].chars().next() {
        if end - start <= c.len_utf8() || !PREFIXES.contains(&c) {
            break;
        }
        out.push(Token::new(source, start, start + c.len_utf8()));
        start += c.len_utf8();
    }

    let mut suffixes = Vec::new();
    while let Some(c) = source[start..end].chars().next_back() {
        if end - start <= c.len_utf8() || !SUFFIXES.contains(&c) {
            break;
        }
        let suffix_start = end - c.len_utf8();
        suffixes.push(Token::new(source, suffix_start, end));
        end = suffix_start;
    }

    let mut piece_start = start;
    for (i, c) in source[start..end].char_indices() {
        if INFIXES.contains(&c) {
            let at = start + i;
            if at > piece_start {
                out.push(Token::new(source, piece_start, at));
            }
            out.push(Token::new(source, at, at + c.len_utf8()));
            piece_start = at + c.len_utf8();
        }
    }
    if end > piece_start {
        out.push(Token::new(source, piece_start, end));
    }

    out.extend(suffixes.into_iter().rev());
}
