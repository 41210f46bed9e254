//! The CSS selector subset used by theme markup.
//!
//! Supported: type, universal, `#id`, `.class`, `[attr]`, `[attr=value]`,
//! compound combinations of those, descendant (` `) and child (`>`)
//! combinators, and comma-separated selector lists.

use crate::document::{Document, NodeId};
use crate::error::DomError;

/// Attribute condition in a compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

/// A compound selector such as `details.facet[open]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(el) = doc.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if &el.name != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|a| match (&a.value, el.attr(&a.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// A complex selector: compounds joined by combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

impl Complex {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.match_at(doc, node, self.compounds.len() - 1)
    }

    fn match_at(&self, doc: &Document, node: NodeId, idx: usize) -> bool {
        if !self.compounds[idx].matches(doc, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => doc
                .parent_element(node)
                .is_some_and(|p| self.match_at(doc, p, idx - 1)),
            Combinator::Descendant => doc
                .ancestors(node)
                .into_iter()
                .filter(|a| doc.element(*a).is_some())
                .any(|a| self.match_at(doc, a, idx - 1)),
        }
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

impl Selector {
    /// Parse selector text.
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let invalid = |reason: &str| DomError::InvalidSelector {
            selector: input.to_string(),
            reason: reason.to_string(),
        };

        let mut alternatives = Vec::new();
        for group in split_top_level(input) {
            let chars: Vec<char> = group.trim().chars().collect();
            if chars.is_empty() {
                return Err(invalid("empty selector"));
            }
            alternatives.push(parse_complex(&chars).map_err(|r| invalid(&r))?);
        }

        Ok(Self {
            source: input.to_string(),
            alternatives,
        })
    }

    /// Selector matching a single id.
    pub fn id(id: &str) -> Self {
        Self {
            source: format!("#{}", id),
            alternatives: vec![Complex {
                compounds: vec![Compound {
                    id: Some(id.to_string()),
                    ..Compound::default()
                }],
                combinators: Vec::new(),
            }],
        }
    }

    /// Whether `node` matches any alternative.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, node))
    }

    /// Original selector text.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split on commas that are not inside brackets or quotes.
fn split_top_level(input: &str) -> Vec<&str> {
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
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn parse_complex(chars: &[char]) -> Result<Complex, String> {
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    let mut pos = 0;
    let mut pending: Option<Combinator> = None;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            if !compounds.is_empty() && pending.is_none() {
                pending = Some(Combinator::Descendant);
            }
            pos += 1;
            continue;
        }
        if c == '>' {
            if compounds.is_empty() {
                return Err("leading combinator".to_string());
            }
            pending = Some(Combinator::Child);
            pos += 1;
            continue;
        }

        let compound = parse_compound(chars, &mut pos)?;
        if !compounds.is_empty() {
            combinators.push(pending.take().ok_or("missing combinator")?);
        }
        pending = None;
        compounds.push(compound);
    }

    if pending == Some(Combinator::Child)
        || compounds.is_empty()
        || combinators.len() + 1 != compounds.len()
    {
        return Err("dangling combinator".to_string());
    }
    Ok(Complex {
        compounds,
        combinators,
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &[char], pos: &mut usize) -> Result<String, String> {
    let start = *pos;
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        *pos += 1;
    }
    if start == *pos {
        return Err("expected identifier".to_string());
    }
    Ok(chars[start..*pos].iter().collect())
}

fn parse_compound(chars: &[char], pos: &mut usize) -> Result<Compound, String> {
    let mut compound = Compound::default();
    let start = *pos;

    while *pos < chars.len() {
        match chars[*pos] {
            '*' if *pos == start => *pos += 1,
            '#' => {
                *pos += 1;
                compound.id = Some(read_ident(chars, pos)?);
            }
            '.' => {
                *pos += 1;
                compound.classes.push(read_ident(chars, pos)?);
            }
            '[' => {
                *pos += 1;
                compound.attrs.push(parse_attr(chars, pos)?);
            }
            c if is_ident_char(c) && *pos == start => {
                compound.tag = Some(read_ident(chars, pos)?.to_ascii_lowercase());
            }
            c if c.is_whitespace() || c == '>' => break,
            c => return Err(format!("unexpected '{}'", c)),
        }
    }

    if *pos == start {
        return Err("empty compound".to_string());
    }
    Ok(compound)
}

fn parse_attr(chars: &[char], pos: &mut usize) -> Result<AttrMatch, String> {
    let name = read_ident(chars, pos)?;
    let mut value = None;

    if *pos < chars.len() && chars[*pos] == '=' {
        *pos += 1;
        let mut v = String::new();
        let quote = match chars.get(*pos) {
            Some(q @ ('"' | '\'')) => {
                *pos += 1;
                Some(*q)
            }
            _ => None,
        };
        loop {
            let Some(&c) = chars.get(*pos) else {
                return Err("unterminated attribute selector".to_string());
            };
            match quote {
                Some(q) if c == q => {
                    *pos += 1;
                    break;
                }
                None if c == ']' => break,
                _ => {
                    v.push(c);
                    *pos += 1;
                }
            }
        }
        value = Some(v);
    }

    if chars.get(*pos) != Some(&']') {
        return Err("expected ']'".to_string());
    }
    *pos += 1;
    Ok(AttrMatch { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse(
            r#"<form id="FacetFiltersForm">
                <details id="Filter-color" class="facet" data-index="1" open>
                    <summary>Color</summary>
                    <ul><li><input type="checkbox" name="filter.v.option.color" value="Red"></li></ul>
                </details>
                <details id="Filter-size" class="facet" data-index="2"></details>
            </form>"#,
        )
    }

    #[test]
    fn test_compound_and_attribute() {
        let doc = doc();
        let open = doc.select(doc.root(), "details.facet[open]").unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(doc.id_of(open[0]), Some("Filter-color"));

        let by_value = doc.select(doc.root(), r#"details[data-index="2"]"#).unwrap();
        assert_eq!(doc.id_of(by_value[0]), Some("Filter-size"));
    }

    #[test]
    fn test_descendant_and_child() {
        let doc = doc();
        assert_eq!(doc.select(doc.root(), "#FacetFiltersForm input").unwrap().len(), 1);
        assert_eq!(doc.select(doc.root(), "#FacetFiltersForm > input").unwrap().len(), 0);
        assert_eq!(doc.select(doc.root(), "form > details > summary").unwrap().len(), 1);
    }

    #[test]
    fn test_selector_list() {
        let doc = doc();
        let found = doc.select(doc.root(), "#Filter-size, summary").unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_invalid_selector() {
        assert!(Selector::parse("div >").is_err());
        assert!(Selector::parse("[data-x").is_err());
        assert!(Selector::parse("").is_err());
    }
}
