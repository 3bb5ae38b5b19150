//! Grammar declaration model.

use crate::{
    list::{ListRole, ListShape},
    precedence::{FamilyID, PrecedenceID, PrecedenceTable},
    types::Map,
    util::{display_fn, verify_ident},
};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, io, path::Path};

// ==== symbol identifiers ====

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerminalID(u16);
impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self(0);
    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.0
    }
}
impl fmt::Debug for TerminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::EOI => write!(f, "T#End"),
            _ => write!(f, "T#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NonterminalID(u16);
impl NonterminalID {
    /// Reserved symbol used as the left side of the augmented start production.
    pub const START: Self = Self(0);
    const OFFSET: u16 = 1;
}
impl fmt::Debug for NonterminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::START => write!(f, "N#Start"),
            _ => write!(f, "N#{:03}", self.0),
        }
    }
}

/// A grammar symbol, either a token or a nonterminal.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}
impl SymbolID {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::T(..))
    }

    /// Whether this symbol is one of the reserved symbols that the user
    /// declarations must not refer to.
    pub fn is_reserved(self) -> bool {
        matches!(self, Self::T(TerminalID::EOI) | Self::N(NonterminalID::START))
    }
}
impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T(t) => write!(f, "{:?}", t),
            Self::N(n) => write!(f, "{:?}", n),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductionID(u16);
impl ProductionID {
    pub const ACCEPT: Self = Self(u16::MAX);
}
impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::ACCEPT => write!(f, "P#Accept"),
            _ => write!(f, "P#{:03}", self.0),
        }
    }
}

// ==== symbols ====

/// A registered terminal symbol.
#[derive(Debug)]
#[non_exhaustive]
pub struct Token {
    /// The canonical name used in grammar texts.
    pub name: String,
    /// The name of the declaring class.
    pub class_name: String,
    /// The name under which the lexer reports this token, and which appears
    /// as the lookahead name in exported tables.
    pub lex_name: String,
    pub value_type: Option<String>,
    pub family: FamilyID,
    pub precedence: Option<PrecedenceID>,
    pub grammar_text: String,
}

/// The declaration of a token.
///
/// The canonical name is taken from [`TokenDecl::name`] when given, otherwise it
/// is inferred from a class name of the form `T_<NAME>`.
#[derive(Debug, Clone)]
pub struct TokenDecl {
    class_name: String,
    name: Option<String>,
    lex_name: Option<String>,
    value_type: Option<String>,
    family: Option<FamilyID>,
    grammar_text: Option<String>,
}

impl TokenDecl {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            name: None,
            lex_name: None,
            value_type: None,
            family: None,
            grammar_text: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the name under which the lexer reports this token.
    pub fn lex_name(mut self, lex_name: impl Into<String>) -> Self {
        self.lex_name = Some(lex_name.into());
        self
    }

    pub fn value_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    /// Set the precedence family used to look up the precedence of this token.
    pub fn precedence_family(mut self, family: FamilyID) -> Self {
        self.family = Some(family);
        self
    }

    pub fn grammar_text(mut self, text: impl Into<String>) -> Self {
        self.grammar_text = Some(text.into());
        self
    }
}

impl From<&str> for TokenDecl {
    fn from(class_name: &str) -> Self {
        Self::new(class_name)
    }
}

/// A registered nonterminal symbol.
#[derive(Debug)]
#[non_exhaustive]
pub struct Nonterminal {
    pub name: String,
    pub value_type: Option<String>,
    pub grammar_text: String,
    /// Set when this symbol was declared as a list nonterminal.
    pub list: Option<ListShape>,
}

#[derive(Debug, Clone)]
pub struct NonterminalDecl {
    pub(crate) name: String,
    pub(crate) value_type: Option<String>,
    pub(crate) grammar_text: Option<String>,
}

impl NonterminalDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: None,
            grammar_text: None,
        }
    }

    pub fn value_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    pub fn grammar_text(mut self, text: impl Into<String>) -> Self {
        self.grammar_text = Some(text.into());
        self
    }
}

impl From<&str> for NonterminalDecl {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ==== productions ====

/// The type that represents a production rule in grammar.
#[derive(Debug)]
#[non_exhaustive]
pub struct Production {
    pub left: NonterminalID,
    pub right: Vec<SymbolID>,
    /// The production (reduction method) name, unique within the left side.
    pub name: String,
    pub grammar_text: String,
    pub precedence: Option<PrecedenceID>,
    /// The index of the child whose value is passed through as the value of
    /// this production.
    pub inline: Option<usize>,
    pub list_role: Option<ListRole>,
}

impl Production {
    /// Return the precedence used when this production competes with a shift.
    ///
    /// Falls back to the precedence of the rightmost token when the production
    /// has no explicit one.
    pub fn precedence(&self, g: &Grammar) -> Option<PrecedenceID> {
        match self.precedence {
            Some(prec) => Some(prec),
            None => {
                for symbol in self.right.iter().rev() {
                    if let SymbolID::T(t) = symbol {
                        return g.terminals[t].precedence;
                    }
                }
                None
            }
        }
    }

    /// `(declaring class name, production name)`
    pub fn qualified_name<'g>(&'g self, g: &'g Grammar) -> (&'g str, &'g str) {
        (&g.nonterminals[&self.left].name, &self.name)
    }

    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} -> ", g.nonterminals[&self.left].name)?;
            if self.right.is_empty() {
                f.write_str("ε")?;
            } else {
                for (i, r) in self.right.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    f.write_str(g.symbol_name(*r))?;
                }
            }
            Ok(())
        })
    }
}

/// The declaration of a production.
///
/// When omitted, the production name is derived from the right-hand symbols
/// (`reduce_A_B_C`, or `reduce_empty` for an empty right side) and so is the
/// grammar text (`%reduce A B C`, or `%reduce <e>`).
///
/// Derived names can collide: `[A_B]` and `[A, B]` both become `reduce_A_B`
/// and the second one fails with [`DeclError::DuplicateProduction`]. Give one
/// of them an explicit [`ProductionDecl::name`].
#[derive(Debug, Clone)]
pub struct ProductionDecl {
    right: Vec<SymbolID>,
    name: Option<String>,
    grammar_text: Option<String>,
    precedence: Option<PrecedenceID>,
    inline: Option<usize>,
}

impl ProductionDecl {
    pub fn new<I>(right: I) -> Self
    where
        I: IntoIterator<Item = SymbolID>,
    {
        Self {
            right: right.into_iter().collect(),
            name: None,
            grammar_text: None,
            precedence: None,
            inline: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn grammar_text(mut self, text: impl Into<String>) -> Self {
        self.grammar_text = Some(text.into());
        self
    }

    pub fn precedence(mut self, precedence: PrecedenceID) -> Self {
        self.precedence = Some(precedence);
        self
    }

    /// Declare that the value of this production is the value of the `index`-th
    /// (0-based) right-hand symbol.
    pub fn inline(mut self, index: usize) -> Self {
        self.inline = Some(index);
        self
    }
}

// ==== grammar ====

/// The grammar definition used to derive the parser tables.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    pub terminals: Map<TerminalID, Token>,
    pub nonterminals: Map<NonterminalID, Nonterminal>,
    pub productions: Map<ProductionID, Production>,
    pub precedences: PrecedenceTable,
    pub start_symbol: NonterminalID,
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, DeclError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), DeclError>,
    {
        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            productions: Map::default(),
            precedences: PrecedenceTable::new(),
            default_family: FamilyID::DEFAULT,
            start: None,
            next_terminal: TerminalID::OFFSET,
            next_nonterminal: NonterminalID::OFFSET,
            next_production: 0,
        };

        def.terminals.insert(
            TerminalID::EOI,
            Token {
                name: "<$>".into(),
                class_name: "<$>".into(),
                lex_name: "<$>".into(),
                value_type: None,
                family: FamilyID::DEFAULT,
                precedence: None,
                grammar_text: "%token <$>".into(),
            },
        );
        def.nonterminals.insert(
            NonterminalID::START,
            Nonterminal {
                name: "<Start>".into(),
                value_type: None,
                grammar_text: "%nonterm".into(),
                list: None,
            },
        );

        f(&mut def)?;

        def.end()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DeclError> {
        let source = fs::read_to_string(path).map_err(DeclError::IO)?;
        Self::from_json(&source)
    }

    /// Define a grammar from a JSON grammar document.
    pub fn from_json(source: &str) -> Result<Self, DeclError> {
        let doc = crate::document::GrammarDocument::from_json(source)?;
        Grammar::define(|g| doc.define(g))
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => &self.terminals[&t].name,
            SymbolID::N(n) => &self.nonterminals[&n].name,
        }
    }

    pub fn token_by_name(&self, name: &str) -> Option<TerminalID> {
        self.terminals
            .iter()
            .find(|(id, t)| **id != TerminalID::EOI && t.name == name)
            .map(|(id, _)| *id)
    }

    pub fn token_by_class(&self, class_name: &str) -> Option<TerminalID> {
        self.terminals
            .iter()
            .find(|(id, t)| **id != TerminalID::EOI && t.class_name == class_name)
            .map(|(id, _)| *id)
    }

    pub fn token_by_lex_name(&self, lex_name: &str) -> Option<TerminalID> {
        self.terminals
            .iter()
            .find(|(_, t)| t.lex_name == lex_name)
            .map(|(id, _)| *id)
    }

    pub fn nonterminal_by_name(&self, name: &str) -> Option<NonterminalID> {
        self.nonterminals
            .iter()
            .find(|(id, n)| **id != NonterminalID::START && n.name == name)
            .map(|(id, _)| *id)
    }

    /// Iterate over the user-declared tokens, as `(canonical name, class name)` pairs.
    pub fn token_classes(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.terminals
            .iter()
            .filter(|(id, _)| **id != TerminalID::EOI)
            .map(|(_, t)| (t.name.as_str(), t.class_name.as_str()))
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.precedences)?;

        writeln!(f, "#### tokens:")?;
        for (&id, t) in &self.terminals {
            if id == TerminalID::EOI {
                continue;
            }
            write!(f, "- {}: {} (lex={}", t.class_name, t.grammar_text, t.lex_name)?;
            if let Some(ty) = &t.value_type {
                write!(f, ", type={}", ty)?;
            }
            if let Some(prec) = t.precedence {
                write!(f, ", prec={}", self.precedences.get(prec).name)?;
            }
            writeln!(f, ")")?;
        }

        writeln!(f, "#### nonterminals:")?;
        for (&id, n) in &self.nonterminals {
            if id == NonterminalID::START {
                continue;
            }
            write!(f, "- {}: {}", n.name, n.grammar_text)?;
            if let Some(ty) = &n.value_type {
                write!(f, " (type={})", ty)?;
            }
            if id == self.start_symbol {
                f.write_str(" (start)")?;
            }
            writeln!(f)?;
            for p in self.productions.values() {
                if p.left != id {
                    continue;
                }
                write!(f, "  - {}: {} # {}", p.name, p.display(self), p.grammar_text)?;
                if let Some(prec) = p.precedence {
                    write!(f, " (prec={})", self.precedences.get(prec).name)?;
                }
                if let Some(i) = p.inline {
                    write!(f, " (inline={})", i)?;
                }
                if let Some(role) = p.list_role {
                    write!(f, " (list={:?})", role)?;
                }
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef {
    terminals: Map<TerminalID, Token>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    precedences: PrecedenceTable,
    default_family: FamilyID,
    start: Option<NonterminalID>,
    next_terminal: u16,
    next_nonterminal: u16,
    next_production: u16,
}

impl GrammarDef {
    /// The precedence table that the declared tokens look up their precedences in.
    pub fn precedences(&mut self) -> &mut PrecedenceTable {
        &mut self.precedences
    }

    /// Set the precedence family used by tokens that do not name one.
    pub fn default_precedence_family(&mut self, family: FamilyID) -> Result<(), DeclError> {
        if !self.precedences.contains_family(family) {
            return Err(DeclError::UnknownPrecedenceFamily {
                family: format!("{:?}", family),
            });
        }
        self.default_family = family;
        Ok(())
    }

    /// Declare a terminal symbol used in this grammar.
    pub fn token(&mut self, decl: impl Into<TokenDecl>) -> Result<TerminalID, DeclError> {
        let TokenDecl {
            class_name,
            name,
            lex_name,
            value_type,
            family,
            grammar_text,
        } = decl.into();

        let name = match name {
            Some(name) => name,
            None => class_name
                .strip_prefix("T_")
                .filter(|name| !name.is_empty())
                .map(ToOwned::to_owned)
                .ok_or_else(|| DeclError::MissingTokenName {
                    class_name: class_name.clone(),
                })?,
        };
        let lex_name = lex_name.unwrap_or_else(|| name.clone());

        if !verify_ident(&class_name) {
            return Err(DeclError::InvalidName {
                kind: "class",
                name: class_name,
            });
        }
        if !verify_ident(&name) {
            return Err(DeclError::InvalidName { kind: "token", name });
        }
        if lex_name.is_empty() || lex_name == "<$>" {
            return Err(DeclError::InvalidName {
                kind: "lexer token",
                name: lex_name,
            });
        }

        for t in self.terminals.values() {
            let what = if t.name == name {
                "name"
            } else if t.class_name == class_name {
                "class"
            } else if t.lex_name == lex_name {
                "lexer name"
            } else {
                continue;
            };
            return Err(DeclError::DuplicateToken {
                what,
                name: t.class_name.clone(),
            });
        }
        if self.nonterminals.values().any(|n| n.name == name) {
            return Err(DeclError::DuplicateToken { what: "name", name });
        }

        let family = family.unwrap_or(self.default_family);
        if !self.precedences.contains_family(family) {
            return Err(DeclError::MissingPrecedenceFamily { token: name });
        }
        let precedence = self.precedences.for_token(family, &name);

        let grammar_text = grammar_text.unwrap_or_else(|| {
            let mut text = format!("%token {}", name);
            if let Some(prec) = precedence {
                text += &format!(" [{}]", self.precedences.get(prec).name);
            }
            text
        });

        let id = TerminalID(self.next_terminal);
        self.next_terminal = id
            .0
            .checked_add(1)
            .ok_or(DeclError::TooManySymbols { kind: "token" })?;
        self.terminals.insert(
            id,
            Token {
                name,
                class_name,
                lex_name,
                value_type,
                family,
                precedence,
                grammar_text,
            },
        );
        Ok(id)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(
        &mut self,
        decl: impl Into<NonterminalDecl>,
    ) -> Result<NonterminalID, DeclError> {
        let NonterminalDecl {
            name,
            value_type,
            grammar_text,
        } = decl.into();

        if !verify_ident(&name) {
            return Err(DeclError::InvalidName {
                kind: "nonterminal",
                name,
            });
        }
        if self.nonterminals.values().any(|n| n.name == name)
            || self.terminals.values().any(|t| t.name == name)
        {
            return Err(DeclError::DuplicateNonterminal { name });
        }

        let id = NonterminalID(self.next_nonterminal);
        self.next_nonterminal = id
            .0
            .checked_add(1)
            .ok_or(DeclError::TooManySymbols { kind: "nonterminal" })?;
        self.nonterminals.insert(
            id,
            Nonterminal {
                name,
                value_type,
                grammar_text: grammar_text.unwrap_or_else(|| "%nonterm".into()),
                list: None,
            },
        );
        Ok(id)
    }

    /// Specify a production rule into this grammer.
    ///
    /// List nonterminals own their productions, so `left` must not be one.
    pub fn production(
        &mut self,
        left: NonterminalID,
        decl: ProductionDecl,
    ) -> Result<ProductionID, DeclError> {
        if let Some(n) = self.nonterminals.get(&left) {
            if n.list.is_some() {
                return Err(DeclError::ListProductionAuthored {
                    name: n.name.clone(),
                });
            }
        }
        self.insert_production(left, decl, None)
    }

    pub(crate) fn insert_production(
        &mut self,
        left: NonterminalID,
        decl: ProductionDecl,
        list_role: Option<ListRole>,
    ) -> Result<ProductionID, DeclError> {
        let ProductionDecl {
            right,
            name,
            grammar_text,
            precedence,
            inline,
        } = decl;

        let class_name = self.nonterminal_name(left)?.to_owned();
        let mut right_names = Vec::with_capacity(right.len());
        for &symbol in &right {
            right_names.push(self.component_name(symbol)?.to_owned());
        }

        let name = name.unwrap_or_else(|| {
            if right_names.is_empty() {
                "reduce_empty".into()
            } else {
                format!("reduce_{}", right_names.join("_"))
            }
        });
        if !verify_ident(&name) {
            return Err(DeclError::InvalidName {
                kind: "production",
                name,
            });
        }

        for p in self.productions.values() {
            if p.left != left {
                continue;
            }
            if p.name == name {
                return Err(DeclError::DuplicateProduction {
                    class_name,
                    name,
                });
            }
            if p.right == right {
                return Err(DeclError::DuplicateRule {
                    class_name,
                    name: p.name.clone(),
                });
            }
        }

        if let Some(index) = inline {
            if index >= right.len() {
                return Err(DeclError::InlineIndexOutOfRange {
                    class_name,
                    name,
                    index,
                    len: right.len(),
                });
            }
        }

        let prec_name = match precedence {
            Some(prec) => Some(
                self.precedences
                    .try_get(prec)
                    .map(|p| p.name.clone())
                    .ok_or_else(|| DeclError::UnknownPrecedence {
                        name: format!("{:?}", prec),
                    })?,
            ),
            None => None,
        };

        let grammar_text = grammar_text.unwrap_or_else(|| {
            let mut text = if right_names.is_empty() {
                "%reduce <e>".to_owned()
            } else {
                format!("%reduce {}", right_names.join(" "))
            };
            if let Some(prec_name) = &prec_name {
                text += &format!(" [{}]", prec_name);
            }
            text
        });

        let id = ProductionID(self.next_production);
        if id == ProductionID::ACCEPT {
            return Err(DeclError::TooManySymbols { kind: "production" });
        }
        self.next_production += 1;
        self.productions.insert(
            id,
            Production {
                left,
                right,
                name,
                grammar_text,
                precedence,
                inline,
                list_role,
            },
        );
        Ok(id)
    }

    /// Specify the start symbol for this grammar.
    ///
    /// If not specified, the first declared nonterminal is used.
    pub fn start_symbol(&mut self, symbol: NonterminalID) -> Result<(), DeclError> {
        self.nonterminal_name(symbol)?;
        self.start.replace(symbol);
        Ok(())
    }

    /// Look up a declared symbol by its canonical name.
    pub fn symbol(&self, name: &str) -> Option<SymbolID> {
        let t = self
            .terminals
            .iter()
            .find(|(id, t)| **id != TerminalID::EOI && t.name == name)
            .map(|(id, _)| SymbolID::T(*id));
        t.or_else(|| {
            self.nonterminals
                .iter()
                .find(|(id, n)| **id != NonterminalID::START && n.name == name)
                .map(|(id, _)| SymbolID::N(*id))
        })
    }

    pub(crate) fn nonterminal_mut(&mut self, id: NonterminalID) -> Option<&mut Nonterminal> {
        self.nonterminals.get_mut(&id)
    }

    fn nonterminal_name(&self, id: NonterminalID) -> Result<&str, DeclError> {
        if id == NonterminalID::START {
            return Err(DeclError::ReservedSymbol {
                symbol: format!("{:?}", id),
            });
        }
        self.nonterminals
            .get(&id)
            .map(|n| n.name.as_str())
            .ok_or_else(|| DeclError::UnknownSymbol {
                symbol: format!("{:?}", id),
            })
    }

    /// Return the canonical name of a symbol declared in this grammar.
    pub(crate) fn component_name(&self, symbol: SymbolID) -> Result<&str, DeclError> {
        if symbol.is_reserved() {
            return Err(DeclError::ReservedSymbol {
                symbol: format!("{:?}", symbol),
            });
        }
        let name = match symbol {
            SymbolID::T(t) => self.terminals.get(&t).map(|t| t.name.as_str()),
            SymbolID::N(n) => self.nonterminals.get(&n).map(|n| n.name.as_str()),
        };
        name.ok_or_else(|| DeclError::UnknownSymbol {
            symbol: format!("{:?}", symbol),
        })
    }

    fn end(mut self) -> Result<Grammar, DeclError> {
        let start = match self.start.take() {
            Some(start) => start,
            None => self
                .nonterminals
                .keys()
                .find(|id| **id != NonterminalID::START)
                .copied()
                .ok_or(DeclError::EmptyGrammar)?,
        };

        self.productions.insert(
            ProductionID::ACCEPT,
            Production {
                left: NonterminalID::START,
                right: vec![SymbolID::N(start), SymbolID::T(TerminalID::EOI)],
                name: "reduce_start".into(),
                grammar_text: "%reduce <start> <$>".into(),
                precedence: None,
                inline: None,
                list_role: None,
            },
        );

        for (id, n) in &self.nonterminals {
            if *id != NonterminalID::START && self.productions.values().all(|p| p.left != *id) {
                tracing::warn!("nonterminal `{}' has no production", n.name);
            }
        }
        for (&id, t) in &self.terminals {
            if id == TerminalID::EOI {
                continue;
            }
            if let Some(prec) = self.precedences.for_token(t.family, &t.name) {
                if t.precedence != Some(prec) {
                    return Err(DeclError::PrecedenceAfterToken {
                        token: t.name.clone(),
                        precedence: self.precedences.get(prec).name.clone(),
                    });
                }
            }
        }
        for (_, prec) in self.precedences.precedences() {
            for token in &prec.tokens {
                if !self.terminals.values().any(|t| &t.name == token) {
                    tracing::warn!(
                        "precedence `{}' binds undeclared token `{}'",
                        prec.name,
                        token
                    );
                }
            }
        }

        Ok(Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            productions: self.productions,
            precedences: self.precedences,
            start_symbol: start,
        })
    }
}

/// Errors raised while declaring a grammar. None of them are recoverable.
#[derive(Debug, thiserror::Error)]
pub enum DeclError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("Syntax error: {}", _0)]
    Syntax(serde_json::Error),

    #[error("token class `{}' must either start with `T_' or specify a token name", class_name)]
    MissingTokenName { class_name: String },

    #[error("incorrect {} name: `{}'", kind, name)]
    InvalidName { kind: &'static str, name: String },

    #[error("the token {} of `{}' has already been registered", what, name)]
    DuplicateToken { what: &'static str, name: String },

    #[error("the symbol `{}' has already been declared", name)]
    DuplicateNonterminal { name: String },

    #[error("unknown symbol: {}", symbol)]
    UnknownSymbol { symbol: String },

    #[error("reserved symbol {} cannot be used in declarations", symbol)]
    ReservedSymbol { symbol: String },

    #[error("production `{}.{}' has already been declared", class_name, name)]
    DuplicateProduction { class_name: String, name: String },

    #[error("production `{}.{}' has the same right-hand side", class_name, name)]
    DuplicateRule { class_name: String, name: String },

    #[error("inline index {} of `{}.{}' is out of range (arity {})", index, class_name, name, len)]
    InlineIndexOutOfRange {
        class_name: String,
        name: String,
        index: usize,
        len: usize,
    },

    #[error("list component must be a token or a nonterminal: {}", symbol)]
    InvalidListComponent { symbol: String },

    #[error("productions of the list nonterminal `{}' are synthesized", name)]
    ListProductionAuthored { name: String },

    #[error("precedence family is not set for the token `{}'", token)]
    MissingPrecedenceFamily { token: String },

    #[error("unknown precedence family: {}", family)]
    UnknownPrecedenceFamily { family: String },

    #[error("precedence family `{}' has already been declared", name)]
    DuplicateFamily { name: String },

    #[error("precedence `{}' has already been declared", name)]
    DuplicatePrecedence { name: String },

    #[error("token `{}' has already been set precedence `{}'", token, existing)]
    DuplicateTokenPrecedence { token: String, existing: String },

    #[error("unknown precedence: {}", name)]
    UnknownPrecedence { name: String },

    #[error("precedence `{}' binds the token `{}' declared before it", precedence, token)]
    PrecedenceAfterToken { token: String, precedence: String },

    #[error("too many {} symbols", kind)]
    TooManySymbols { kind: &'static str },

    #[error("empty nonterminal symbols")]
    EmptyGrammar,

    #[error("Other error: {}", msg)]
    Other { msg: String },
}
impl From<&str> for DeclError {
    fn from(msg: &str) -> Self {
        Self::Other { msg: msg.into() }
    }
}
impl From<String> for DeclError {
    fn from(msg: String) -> Self {
        Self::Other { msg }
    }
}
