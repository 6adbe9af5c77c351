//! CSS selector subset used by site adapters and the overlay
//!
//! Supported: type and universal selectors, `#id`, `.class`, `[attr]`,
//! `[attr="value"]`, compounds of these, the descendant combinator and
//! selector lists. Anything else is rejected at parse time.

use std::fmt;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

use crate::errors::SelectorError;
use crate::NodeId;

/// Read access the matcher needs from a tree.
pub(crate) trait SelectorTarget {
    fn tag(&self, node: NodeId) -> Option<&str>;
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
}

/// Parsed selector list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: Vec<ComplexSelector>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ComplexSelector {
    // Left to right, joined by descendant combinators.
    parts: Vec<Compound>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    universal: bool,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut parser = Parser {
            chars: input.chars().peekable(),
            source: input,
        };
        let groups = parser.parse_list()?;
        Ok(Self {
            source: input.trim().to_string(),
            groups,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn matches<T: SelectorTarget>(&self, tree: &T, node: NodeId) -> bool {
        self.groups.iter().any(|group| group.matches(tree, node))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl ComplexSelector {
    fn matches<T: SelectorTarget>(&self, tree: &T, node: NodeId) -> bool {
        let Some((last, ancestors)) = self.parts.split_last() else {
            return false;
        };
        if !last.matches(tree, node) {
            return false;
        }
        // Descendant-only chains can be matched greedily from the right.
        let mut cursor = tree.parent(node);
        for part in ancestors.iter().rev() {
            loop {
                let Some(candidate) = cursor else {
                    return false;
                };
                cursor = tree.parent(candidate);
                if part.matches(tree, candidate) {
                    break;
                }
            }
        }
        true
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
    }

    fn matches<T: SelectorTarget>(&self, tree: &T, node: NodeId) -> bool {
        let Some(tag) = tree.tag(node) else {
            return false;
        };
        if let Some(expected) = &self.tag {
            if expected != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if tree.attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = tree.attribute(node, "class").unwrap_or_default();
            let has_all = self
                .classes
                .iter()
                .all(|class| class_attr.split_whitespace().any(|c| c == class));
            if !has_all {
                return false;
            }
        }
        self.attributes
            .iter()
            .all(|attr| match (tree.attribute(node, &attr.name), &attr.value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
            })
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    source: &'a str,
}

impl Parser<'_> {
    fn parse_list(&mut self) -> Result<Vec<ComplexSelector>, SelectorError> {
        let mut groups = Vec::new();
        loop {
            self.skip_whitespace();
            groups.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.chars.next() {
                None => break,
                Some(',') => continue,
                Some(c) => return Err(self.unexpected(c)),
            }
        }
        Ok(groups)
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut parts = Vec::new();
        loop {
            let compound = self.parse_compound()?;
            if compound.is_empty() {
                return match self.chars.peek().copied() {
                    None | Some(',') => Err(SelectorError::Empty(self.source.to_string())),
                    Some(c) => Err(self.unexpected(c)),
                };
            }
            parts.push(compound);

            let had_whitespace = self.skip_whitespace();
            match self.chars.peek().copied() {
                None | Some(',') => break,
                Some(_) if had_whitespace => continue,
                Some(c) => return Err(self.unexpected(c)),
            }
        }
        Ok(ComplexSelector { parts })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        while let Some(&c) = self.chars.peek() {
            match c {
                '*' if compound.is_empty() => {
                    self.chars.next();
                    compound.universal = true;
                }
                '#' => {
                    self.chars.next();
                    compound.id = Some(self.identifier()?);
                }
                '.' => {
                    self.chars.next();
                    compound.classes.push(self.identifier()?);
                }
                '[' => {
                    self.chars.next();
                    compound.attributes.push(self.parse_attribute()?);
                }
                c if is_identifier_char(c) && compound.is_empty() => {
                    compound.tag = Some(self.identifier()?.to_ascii_lowercase());
                }
                _ => break,
            }
        }
        Ok(compound)
    }

    fn parse_attribute(&mut self) -> Result<AttributeMatch, SelectorError> {
        self.skip_whitespace();
        let name = self.identifier()?.to_ascii_lowercase();
        self.skip_whitespace();
        match self.chars.next() {
            Some(']') => Ok(AttributeMatch { name, value: None }),
            Some('=') => {
                self.skip_whitespace();
                let value = match self.chars.peek().copied() {
                    Some(quote @ ('"' | '\'')) => {
                        self.chars.next();
                        self.quoted(quote)?
                    }
                    Some(_) => self.identifier()?,
                    None => return Err(SelectorError::UnexpectedEnd(self.source.to_string())),
                };
                self.skip_whitespace();
                match self.chars.next() {
                    Some(']') => Ok(AttributeMatch {
                        name,
                        value: Some(value),
                    }),
                    Some(c) => Err(self.unexpected(c)),
                    None => Err(SelectorError::UnexpectedEnd(self.source.to_string())),
                }
            }
            Some(c) => Err(self.unexpected(c)),
            None => Err(SelectorError::UnexpectedEnd(self.source.to_string())),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut value = String::new();
        for c in self.chars.by_ref() {
            if c == quote {
                return Ok(value);
            }
            value.push(c);
        }
        Err(SelectorError::UnterminatedString(self.source.to_string()))
    }

    fn identifier(&mut self) -> Result<String, SelectorError> {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if !is_identifier_char(c) {
                break;
            }
            ident.push(c);
            self.chars.next();
        }
        if ident.is_empty() {
            return match self.chars.peek().copied() {
                Some(c) => Err(self.unexpected(c)),
                None => Err(SelectorError::UnexpectedEnd(self.source.to_string())),
            };
        }
        Ok(ident)
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
            skipped = true;
        }
        skipped
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::Unexpected {
            selector: self.source.to_string(),
            found,
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_forms() {
        for input in [
            "aside",
            "*",
            "#main",
            ".block.time-tracking",
            "[data-testid=\"work-item-time-tracking\"]",
            "[data-testid='x']",
            "[hidden]",
            "div.block [data-testid=foo]",
            "h3, .title, .block-title, div, span",
        ] {
            assert!(Selector::parse(input).is_ok(), "failed to parse {input}");
        }
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert!(matches!(
            Selector::parse(""),
            Err(SelectorError::Empty(_))
        ));
        assert!(matches!(
            Selector::parse("div,"),
            Err(SelectorError::Empty(_))
        ));
        assert!(matches!(
            Selector::parse("div > span"),
            Err(SelectorError::Unexpected { found: '>', .. })
        ));
        assert!(matches!(
            Selector::parse("a:hover"),
            Err(SelectorError::Unexpected { found: ':', .. })
        ));
        assert!(matches!(
            Selector::parse("[data-x=\"open"),
            Err(SelectorError::UnterminatedString(_))
        ));
        assert!(matches!(
            Selector::parse("[data-x"),
            Err(SelectorError::UnexpectedEnd(_))
        ));
    }

    #[test]
    fn keeps_source_text() {
        let selector: Selector = " .right-sidebar ".parse().unwrap();
        assert_eq!(selector.as_str(), ".right-sidebar");
        assert_eq!(selector.to_string(), ".right-sidebar");
    }
}
