//! Minimal CSS selector engine for the in-memory DOM
//!
//! Supports what landing page markup contracts use: type, `#id`, `.class`,
//! `[attr]`, `[attr="v"]`, `[attr^="v"]`, the descendant combinator and
//! comma-separated lists. Matching runs right to left over ancestors.

use crate::dom::ElementId;
use crate::{Error, Result};

/// Read access to a tree that selectors can be matched against
pub trait SelectorTree {
    fn node_tag(&self, el: ElementId) -> &str;
    fn node_id(&self, el: ElementId) -> Option<&str>;
    fn node_has_class(&self, el: ElementId, class: &str) -> bool;
    fn node_attr(&self, el: ElementId, name: &str) -> Option<&str>;
    fn node_parent(&self, el: ElementId) -> Option<ElementId>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrFilter {
    name: String,
    op: AttrOp,
}

/// A run of simple selectors with no combinator, e.g. `a.cta[href^="#"]`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrFilter>,
}

impl Compound {
    fn matches<T: SelectorTree + ?Sized>(&self, tree: &T, el: ElementId) -> bool {
        if let Some(tag) = &self.tag {
            if !tree.node_tag(el).eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if tree.node_id(el) != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| tree.node_has_class(el, class)) {
            return false;
        }
        self.attrs.iter().all(|filter| match (&filter.op, tree.node_attr(el, &filter.name)) {
            (_, None) => false,
            (AttrOp::Exists, Some(_)) => true,
            (AttrOp::Equals(expected), Some(value)) => value == expected,
            (AttrOp::Prefix(prefix), Some(value)) => !prefix.is_empty() && value.starts_with(prefix.as_str()),
        })
    }
}

/// Compounds joined by descendant combinators, leftmost first
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
}

impl Complex {
    fn matches<T: SelectorTree + ?Sized>(&self, tree: &T, el: ElementId) -> bool {
        let Some((last, ancestors)) = self.compounds.split_last() else {
            return false;
        };
        if !last.matches(tree, el) {
            return false;
        }

        // Greedy ancestor walk is exact for descendant-only chains
        let mut current = tree.node_parent(el);
        for compound in ancestors.iter().rev() {
            loop {
                match current {
                    None => return false,
                    Some(node) => {
                        current = tree.node_parent(node);
                        if compound.matches(tree, node) {
                            break;
                        }
                    }
                }
            }
        }
        true
    }
}

/// Parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self> {
        let alternatives = split_top_level(input, |c| c == ',')
            .map_err(|reason| selector_error(input, reason))?
            .into_iter()
            .map(|part| parse_complex(part).map_err(|reason| selector_error(input, reason)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { alternatives })
    }

    pub fn matches<T: SelectorTree + ?Sized>(&self, tree: &T, el: ElementId) -> bool {
        self.alternatives.iter().any(|complex| complex.matches(tree, el))
    }
}

fn selector_error(selector: &str, reason: impl Into<String>) -> Error {
    Error::Selector {
        selector: selector.to_string(),
        reason: reason.into(),
    }
}

/// Split on `is_sep` outside brackets and quotes, dropping empty pieces for
/// whitespace separators and rejecting them otherwise
fn split_top_level(input: &str, is_sep: impl Fn(char) -> bool) -> std::result::Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.checked_sub(1).ok_or("unbalanced ']'")?,
            (None, c) if depth == 0 && is_sep(c) => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err("unterminated string".to_string());
    }
    if depth != 0 {
        return Err("unbalanced '['".to_string());
    }
    parts.push(&input[start..]);

    let whitespace = is_sep(' ');
    let mut cleaned = Vec::with_capacity(parts.len());
    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            if whitespace {
                continue;
            }
            return Err("empty selector".to_string());
        }
        cleaned.push(part);
    }
    if cleaned.is_empty() {
        return Err("empty selector".to_string());
    }
    Ok(cleaned)
}

fn parse_complex(input: &str) -> std::result::Result<Complex, String> {
    if input.contains(['>', '+', '~']) && !input.contains('[') {
        return Err("only the descendant combinator is supported".to_string());
    }
    let compounds = split_top_level(input, char::is_whitespace)?
        .into_iter()
        .map(parse_compound)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Complex { compounds })
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn read_ident(chars: &[char], pos: &mut usize) -> std::result::Result<String, String> {
    let start = *pos;
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        *pos += 1;
    }
    if *pos == start {
        return Err(format!("expected identifier at offset {}", start));
    }
    Ok(chars[start..*pos].iter().collect())
}

fn parse_compound(input: &str) -> std::result::Result<Compound, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut compound = Compound::default();
    let mut pos = 0;

    if chars.first() == Some(&'*') {
        pos = 1;
    } else if chars.first().is_some_and(|c| c.is_alphabetic()) {
        compound.tag = Some(read_ident(&chars, &mut pos)?.to_ascii_lowercase());
    }

    while pos < chars.len() {
        match chars[pos] {
            '#' => {
                pos += 1;
                compound.id = Some(read_ident(&chars, &mut pos)?);
            }
            '.' => {
                pos += 1;
                compound.classes.push(read_ident(&chars, &mut pos)?);
            }
            '[' => {
                pos += 1;
                let close = chars[pos..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|offset| pos + offset)
                    .ok_or("unbalanced '['")?;
                let body: String = chars[pos..close].iter().collect();
                compound.attrs.push(parse_attr(&body)?);
                pos = close + 1;
            }
            other => return Err(format!("unexpected '{}'", other)),
        }
    }
    Ok(compound)
}

fn parse_attr(body: &str) -> std::result::Result<AttrFilter, String> {
    let (name, op) = if let Some((name, value)) = body.split_once("^=") {
        (name, Some(('^', value)))
    } else if let Some((name, value)) = body.split_once('=') {
        (name, Some(('=', value)))
    } else {
        (body, None)
    };

    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(format!("invalid attribute name '{}'", name));
    }

    let op = match op {
        None => AttrOp::Exists,
        Some((kind, raw)) => {
            let raw = raw.trim();
            let value = raw
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| raw.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(raw)
                .to_string();
            if kind == '^' {
                AttrOp::Prefix(value)
            } else {
                AttrOp::Equals(value)
            }
        }
    };

    Ok(AttrFilter {
        name: name.to_ascii_lowercase(),
        op,
    })
}
