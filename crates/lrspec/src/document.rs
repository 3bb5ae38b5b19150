//! Grammar definitions written as JSON documents.
//!
//! ```json
//! {
//!   "precedences": [{ "name": "P_ADD", "assoc": "left", "tokens": ["PLUS"] }],
//!   "tokens": [{ "class": "T_NUM" }, { "class": "T_PLUS", "lex": "+" }],
//!   "nonterminals": [
//!     { "name": "Expr", "productions": [
//!         { "rhs": ["Expr", "PLUS", "Expr"] },
//!         { "rhs": ["NUM"] }
//!     ] },
//!     { "name": "ExprList", "list": { "element": "Expr" } }
//!   ],
//!   "start": "ExprList"
//! }
//! ```

use crate::{
    grammar::{
        DeclError, GrammarDef, NonterminalDecl, NonterminalID, ProductionDecl, SymbolID, TokenDecl,
    },
    list::ListDecl,
    precedence::{Assoc, FamilyID, PrecedenceDecl, Relation},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarDocument {
    #[serde(default)]
    pub precedences: Vec<PrecedenceDoc>,
    #[serde(default)]
    pub tokens: Vec<TokenDoc>,
    #[serde(default)]
    pub nonterminals: Vec<NonterminalDoc>,
    /// Defaults to the first nonterminal of the document, list or not.
    #[serde(default)]
    pub start: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrecedenceDoc {
    pub name: String,
    pub assoc: Assoc,
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub rel: Relation,
    /// Defaults to the `Precedence` family. Other families are created on first use.
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenDoc {
    pub class: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lex: Option<String>,
    #[serde(default, rename = "type")]
    pub value_type: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NonterminalDoc {
    pub name: String,
    #[serde(default, rename = "type")]
    pub value_type: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub productions: Vec<ProductionDoc>,
    #[serde(default)]
    pub list: Option<ListDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductionDoc {
    #[serde(default)]
    pub name: Option<String>,
    pub rhs: Vec<String>,
    #[serde(default)]
    pub precedence: Option<String>,
    #[serde(default)]
    pub inline: Option<usize>,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListDoc {
    pub element: String,
    #[serde(default)]
    pub separator: Option<String>,
}

impl GrammarDocument {
    pub fn from_json(source: &str) -> Result<Self, DeclError> {
        serde_json::from_str(source).map_err(DeclError::Syntax)
    }

    /// Declare the contents of this document into the grammar.
    ///
    /// List nonterminals are declared after all plain ones, so that a list
    /// may refer to nonterminals declared later in the document. A list whose
    /// element is another list must come after it.
    pub fn define(&self, g: &mut GrammarDef) -> Result<(), DeclError> {
        for prec in &self.precedences {
            let family = match &prec.family {
                Some(name) => match g.precedences().family_by_name(name) {
                    Some(family) => family,
                    None => g.precedences().family(name)?,
                },
                None => FamilyID::DEFAULT,
            };
            let mut decl = PrecedenceDecl::new(&*prec.name, prec.assoc)
                .tokens(prec.tokens.iter().cloned())
                .relation(prec.rel);
            if let Some(group) = &prec.group {
                decl = decl.group(&**group);
            }
            if let Some(doc) = &prec.doc {
                decl = decl.grammar_text(&**doc);
            }
            g.precedences().declare(family, decl)?;
        }

        for token in &self.tokens {
            let mut decl = TokenDecl::new(&*token.class);
            if let Some(name) = &token.name {
                decl = decl.name(&**name);
            }
            if let Some(lex) = &token.lex {
                decl = decl.lex_name(&**lex);
            }
            if let Some(ty) = &token.value_type {
                decl = decl.value_type(&**ty);
            }
            if let Some(family) = &token.family {
                let family = g.precedences().family_by_name(family).ok_or_else(|| {
                    DeclError::UnknownPrecedenceFamily {
                        family: family.clone(),
                    }
                })?;
                decl = decl.precedence_family(family);
            }
            if let Some(doc) = &token.doc {
                decl = decl.grammar_text(&**doc);
            }
            g.token(decl)?;
        }

        let mut plain: Vec<(NonterminalID, &NonterminalDoc)> = vec![];
        for n in self.nonterminals.iter().filter(|n| n.list.is_none()) {
            let mut decl = NonterminalDecl::new(&*n.name);
            if let Some(ty) = &n.value_type {
                decl = decl.value_type(&**ty);
            }
            if let Some(doc) = &n.doc {
                decl = decl.grammar_text(&**doc);
            }
            plain.push((g.nonterminal(decl)?, n));
        }

        for n in &self.nonterminals {
            let list = match &n.list {
                Some(list) => list,
                None => continue,
            };
            if !n.productions.is_empty() {
                return Err(DeclError::ListProductionAuthored {
                    name: n.name.clone(),
                });
            }
            let mut decl = ListDecl::new(&*n.name, lookup(g, &list.element)?);
            if let Some(separator) = &list.separator {
                decl = decl.separator(lookup(g, separator)?);
            }
            if let Some(ty) = &n.value_type {
                decl = decl.value_type(&**ty);
            }
            g.list_nonterminal(decl)?;
        }

        for (id, n) in plain {
            for p in &n.productions {
                let right = p
                    .rhs
                    .iter()
                    .map(|name| lookup(g, name))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut decl = ProductionDecl::new(right);
                if let Some(name) = &p.name {
                    decl = decl.name(&**name);
                }
                if let Some(prec) = &p.precedence {
                    let prec = g.precedences().by_name(prec).ok_or_else(|| {
                        DeclError::UnknownPrecedence { name: prec.clone() }
                    })?;
                    decl = decl.precedence(prec);
                }
                if let Some(index) = p.inline {
                    decl = decl.inline(index);
                }
                if let Some(doc) = &p.doc {
                    decl = decl.grammar_text(&**doc);
                }
                g.production(id, decl)?;
            }
        }

        let start = self
            .start
            .as_ref()
            .or_else(|| self.nonterminals.first().map(|n| &n.name));
        if let Some(start) = start {
            match lookup(g, start)? {
                SymbolID::N(n) => g.start_symbol(n)?,
                SymbolID::T(..) => {
                    return Err(format!("the start symbol `{}' must be a nonterminal", start).into())
                }
            }
        }

        Ok(())
    }
}

fn lookup(g: &GrammarDef, name: &str) -> Result<SymbolID, DeclError> {
    g.symbol(name).ok_or_else(|| DeclError::UnknownSymbol {
        symbol: name.to_owned(),
    })
}
