//! Precedence declarations and the order among them.

use crate::{grammar::DeclError, types::Map, util::verify_ident};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

/// A namespace of precedence declarations.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FamilyID(u16);
impl FamilyID {
    /// The family named `Precedence`, available in every table.
    pub const DEFAULT: Self = Self(0);
}
impl fmt::Debug for FamilyID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F#{:03}", self.0)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrecedenceID(u16);
impl fmt::Debug for PrecedenceID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prec#{:03}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assoc {
    Left,
    Right,
    #[serde(alias = "none")]
    Nonassoc,
    /// Equal precedences are left as an unresolved conflict.
    Fail,
}
impl fmt::Display for Assoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Nonassoc => "nonassoc",
            Self::Fail => "fail",
        })
    }
}

/// The relation of a declaration to the previous one in the same group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Relation {
    #[default]
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
}
impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Greater => ">",
            Self::Less => "<",
        })
    }
}

#[derive(Debug, Clone)]
pub struct PrecedenceDecl {
    name: String,
    assoc: Assoc,
    tokens: Vec<String>,
    group: Option<String>,
    relation: Relation,
    grammar_text: Option<String>,
}

impl PrecedenceDecl {
    pub fn new(name: impl Into<String>, assoc: Assoc) -> Self {
        Self {
            name: name.into(),
            assoc,
            tokens: vec![],
            group: None,
            relation: Relation::default(),
            grammar_text: None,
        }
    }

    pub fn left(name: impl Into<String>) -> Self {
        Self::new(name, Assoc::Left)
    }

    pub fn right(name: impl Into<String>) -> Self {
        Self::new(name, Assoc::Right)
    }

    pub fn nonassoc(name: impl Into<String>) -> Self {
        Self::new(name, Assoc::Nonassoc)
    }

    pub fn fail(name: impl Into<String>) -> Self {
        Self::new(name, Assoc::Fail)
    }

    /// Bind the tokens, by canonical name, to this declaration.
    pub fn tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.relation = relation;
        self
    }

    pub fn grammar_text(mut self, text: impl Into<String>) -> Self {
        self.grammar_text = Some(text.into());
        self
    }
}

/// A declared precedence.
#[derive(Debug)]
#[non_exhaustive]
pub struct Precedence {
    pub name: String,
    pub family: FamilyID,
    pub assoc: Assoc,
    pub group: Option<String>,
    /// The declaration this one was chained after, if any.
    pub previous: Option<(Relation, PrecedenceID)>,
    pub tokens: Vec<String>,
    pub grammar_text: String,
}

#[derive(Debug)]
struct Family {
    name: String,
    last: Map<Option<String>, PrecedenceID>,
    tokens: Map<String, PrecedenceID>,
}

/// The builder and the registry of precedence declarations.
#[derive(Debug)]
pub struct PrecedenceTable {
    families: Vec<Family>,
    precedences: Vec<Precedence>,
}

impl Default for PrecedenceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PrecedenceTable {
    pub fn new() -> Self {
        Self {
            families: vec![Family {
                name: "Precedence".into(),
                last: Map::default(),
                tokens: Map::default(),
            }],
            precedences: vec![],
        }
    }

    /// Declare a new precedence family.
    pub fn family(&mut self, name: &str) -> Result<FamilyID, DeclError> {
        if !verify_ident(name) {
            return Err(DeclError::InvalidName {
                kind: "precedence family",
                name: name.into(),
            });
        }
        if self.family_by_name(name).is_some() {
            return Err(DeclError::DuplicateFamily { name: name.into() });
        }
        let id = FamilyID(self.families.len() as u16);
        self.families.push(Family {
            name: name.into(),
            last: Map::default(),
            tokens: Map::default(),
        });
        Ok(id)
    }

    pub fn family_by_name(&self, name: &str) -> Option<FamilyID> {
        self.families
            .iter()
            .position(|f| f.name == name)
            .map(|i| FamilyID(i as u16))
    }

    pub fn family_name(&self, family: FamilyID) -> Option<&str> {
        self.families
            .get(family.0 as usize)
            .map(|f| f.name.as_str())
    }

    pub fn contains_family(&self, family: FamilyID) -> bool {
        (family.0 as usize) < self.families.len()
    }

    /// Declare a precedence in the specified family.
    ///
    /// The declaration is chained after the latest declaration in the same
    /// family and group, with the relation given by [`PrecedenceDecl::relation`].
    pub fn declare(
        &mut self,
        family: FamilyID,
        decl: PrecedenceDecl,
    ) -> Result<PrecedenceID, DeclError> {
        let PrecedenceDecl {
            name,
            assoc,
            tokens,
            group,
            relation,
            grammar_text,
        } = decl;

        if !verify_ident(&name) {
            return Err(DeclError::InvalidName {
                kind: "precedence",
                name,
            });
        }
        if self.by_name(&name).is_some() {
            return Err(DeclError::DuplicatePrecedence { name });
        }
        let fam = self
            .families
            .get(family.0 as usize)
            .ok_or_else(|| DeclError::UnknownPrecedenceFamily {
                family: format!("{:?}", family),
            })?;
        for (i, token) in tokens.iter().enumerate() {
            if let Some(existing) = fam.tokens.get(token) {
                return Err(DeclError::DuplicateTokenPrecedence {
                    token: token.clone(),
                    existing: self.precedences[existing.0 as usize].name.clone(),
                });
            }
            if tokens[..i].contains(token) {
                return Err(DeclError::DuplicateTokenPrecedence {
                    token: token.clone(),
                    existing: name,
                });
            }
        }

        let previous = fam.last.get(&group).map(|prev| (relation, *prev));
        let grammar_text = grammar_text.unwrap_or_else(|| match previous {
            Some((rel, prev)) => format!(
                "%{} {}{}",
                assoc,
                rel,
                self.precedences[prev.0 as usize].name
            ),
            None => format!("%{}", assoc),
        });

        let id = PrecedenceID(self.precedences.len() as u16);
        let fam = &mut self.families[family.0 as usize];
        fam.last.insert(group.clone(), id);
        for token in &tokens {
            fam.tokens.insert(token.clone(), id);
        }

        tracing::trace!("declare precedence {} ({:?}): {}", name, id, grammar_text);
        self.precedences.push(Precedence {
            name,
            family,
            assoc,
            group,
            previous,
            tokens,
            grammar_text,
        });
        Ok(id)
    }

    /// Return the precedence bound to the token in the specified family.
    pub fn for_token(&self, family: FamilyID, token: &str) -> Option<PrecedenceID> {
        self.families
            .get(family.0 as usize)
            .and_then(|f| f.tokens.get(token))
            .copied()
    }

    /// Panics if the ID was not issued by this table.
    pub fn get(&self, id: PrecedenceID) -> &Precedence {
        &self.precedences[id.0 as usize]
    }

    pub fn try_get(&self, id: PrecedenceID) -> Option<&Precedence> {
        self.precedences.get(id.0 as usize)
    }

    pub fn by_name(&self, name: &str) -> Option<PrecedenceID> {
        self.precedences
            .iter()
            .position(|p| p.name == name)
            .map(|i| PrecedenceID(i as u16))
    }

    pub fn precedences(&self) -> impl Iterator<Item = (PrecedenceID, &Precedence)> + '_ {
        self.precedences
            .iter()
            .enumerate()
            .map(|(i, p)| (PrecedenceID(i as u16), p))
    }

    /// Compare two precedences by the transitive closure of the declared relations.
    ///
    /// Returns `None` if they are unrelated.
    pub fn compare(&self, a: PrecedenceID, b: PrecedenceID) -> Option<Ordering> {
        if a == b {
            Some(Ordering::Equal)
        } else if self.is_higher(a, b) {
            Some(Ordering::Greater)
        } else if self.is_higher(b, a) {
            Some(Ordering::Less)
        } else {
            None
        }
    }

    fn is_higher(&self, high: PrecedenceID, low: PrecedenceID) -> bool {
        let mut visited = vec![false; self.precedences.len()];
        let mut stack = vec![high];
        while let Some(current) = stack.pop() {
            if std::mem::replace(&mut visited[current.0 as usize], true) {
                continue;
            }
            for lower in self.directly_lower(current) {
                if lower == low {
                    return true;
                }
                stack.push(lower);
            }
        }
        false
    }

    fn directly_lower(&self, id: PrecedenceID) -> impl Iterator<Item = PrecedenceID> + '_ {
        let chained = match self.get(id).previous {
            Some((Relation::Greater, prev)) => Some(prev),
            _ => None,
        };
        let followers = self.precedences().filter_map(move |(other, p)| match p.previous {
            Some((Relation::Less, prev)) if prev == id => Some(other),
            _ => None,
        });
        chained.into_iter().chain(followers)
    }
}

impl fmt::Display for PrecedenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#### precedences:")?;
        for p in &self.precedences {
            write!(
                f,
                "- {}.{}: {}",
                self.families[p.family.0 as usize].name,
                p.name,
                p.grammar_text
            )?;
            write!(f, " (assoc={}", p.assoc)?;
            if let Some((rel, prev)) = p.previous {
                write!(f, ", {}{}", rel, self.precedences[prev.0 as usize].name)?;
            }
            f.write_str(")")?;
            if let Some(group) = &p.group {
                write!(f, " (group={})", group)?;
            }
            if !p.tokens.is_empty() {
                write!(f, " [{}]", p.tokens.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
