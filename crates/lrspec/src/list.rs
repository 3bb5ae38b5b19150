//! Synthesized productions for separated and unseparated lists.

use crate::grammar::{
    DeclError, GrammarDef, NonterminalDecl, NonterminalID, ProductionDecl, SymbolID,
};
use serde::{Deserialize, Serialize};

/// The element and the separator of a list nonterminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListShape {
    pub element: SymbolID,
    pub separator: Option<SymbolID>,
}

/// The role of a synthesized list production.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListRole {
    /// `List -> Element`
    Singleton,
    /// `List -> List [Separator] Element`
    Extension,
}

impl ListRole {
    /// Compute the value of a list production from the values of its right-hand
    /// symbols.
    ///
    /// `list` is the accumulated list for extensions and is ignored for the
    /// singleton production.
    pub fn apply<V>(self, list: Option<Vec<V>>, element: Option<V>) -> Vec<V> {
        match self {
            Self::Singleton => reduce_element(element),
            Self::Extension => reduce_list(list.unwrap_or_default(), element),
        }
    }
}

/// The value of `List -> Element`.
pub fn reduce_element<V>(element: Option<V>) -> Vec<V> {
    element.into_iter().collect()
}

/// The value of `List -> List [Separator] Element`.
pub fn reduce_list<V>(mut list: Vec<V>, element: Option<V>) -> Vec<V> {
    list.extend(element);
    list
}

#[derive(Debug, Clone)]
pub struct ListDecl {
    name: String,
    element: SymbolID,
    separator: Option<SymbolID>,
    value_type: Option<String>,
}

impl ListDecl {
    pub fn new(name: impl Into<String>, element: SymbolID) -> Self {
        Self {
            name: name.into(),
            element,
            separator: None,
            value_type: None,
        }
    }

    pub fn separator(mut self, separator: SymbolID) -> Self {
        self.separator = Some(separator);
        self
    }

    pub fn value_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }
}

impl GrammarDef {
    /// Declare a list nonterminal along with its two productions.
    pub fn list_nonterminal(&mut self, decl: ListDecl) -> Result<NonterminalID, DeclError> {
        let ListDecl {
            name,
            element,
            separator,
            value_type,
        } = decl;

        let element_name = self.list_component(element)?;
        let separator_name = match separator {
            Some(separator) => Some(self.list_component(separator)?),
            None => None,
        };

        let mut nonterminal = NonterminalDecl::new(&*name);
        nonterminal.value_type = value_type;
        let id = self.nonterminal(nonterminal)?;

        let (tail_name, tail_right) = match (&separator_name, separator) {
            (Some(sep_name), Some(sep)) => (
                format!("reduce_{}_{}_{}", name, sep_name, element_name),
                vec![SymbolID::N(id), sep, element],
            ),
            _ => (
                format!("reduce_{}_{}", name, element_name),
                vec![SymbolID::N(id), element],
            ),
        };

        self.insert_production(
            id,
            ProductionDecl::new([element]).name(format!("reduce_{}", element_name)),
            Some(ListRole::Singleton),
        )?;
        self.insert_production(
            id,
            ProductionDecl::new(tail_right).name(tail_name),
            Some(ListRole::Extension),
        )?;

        if let Some(n) = self.nonterminal_mut(id) {
            n.list = Some(ListShape { element, separator });
        }

        Ok(id)
    }

    fn list_component(&self, symbol: SymbolID) -> Result<String, DeclError> {
        self.component_name(symbol)
            .map(ToOwned::to_owned)
            .map_err(|_| DeclError::InvalidListComponent {
                symbol: format!("{:?}", symbol),
            })
    }
}
