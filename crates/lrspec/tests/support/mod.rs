//! A table-driven LR parser over exported tables, used to check the
//! semantics of the tables end to end.

#![allow(dead_code)]

use lrspec::{
    compiler::Config,
    export::{export, ExportAction, ExportedTable, EOI_NAME},
    grammar::Grammar,
    list::{reduce_element, reduce_list, ListRole},
};
use std::{env, path::PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Token(String),
    Node {
        production: String,
        children: Vec<Value>,
    },
    List(Vec<Value>),
    Empty,
}

impl Value {
    /// Render the value as an S-expression.
    pub fn sexp(&self) -> String {
        match self {
            Value::Token(text) => text.clone(),
            Value::Node {
                production,
                children,
            } => {
                let mut s = format!("({}", production);
                for child in children {
                    s += " ";
                    s += &child.sexp();
                }
                s + ")"
            }
            Value::List(items) => {
                let items: Vec<_> = items.iter().map(Value::sexp).collect();
                format!("[{}]", items.join(" "))
            }
            Value::Empty => "_".into(),
        }
    }

    fn into_option(self) -> Option<Value> {
        match self {
            Value::Empty => None,
            value => Some(value),
        }
    }
}

pub fn grammar_path(name: &str) -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
        .join("tests/grammars")
        .join(format!("{}.grammar.json", name))
}

pub fn load(name: &str) -> (Grammar, ExportedTable) {
    let grammar = Grammar::from_file(grammar_path(name)).unwrap();
    let table = {
        let spec = Config::new().compile(&grammar).unwrap();
        export(&spec)
    };
    (grammar, table)
}

/// Parse the `(lexer name, text)` tokens and build the value of the start symbol.
pub fn parse(g: &Grammar, table: &ExportedTable, tokens: &[(&str, &str)]) -> Result<Value, String> {
    let accept_state = table.goto(0, &table.start);
    let mut states: Vec<usize> = vec![0];
    let mut values: Vec<Value> = vec![];
    let mut input = tokens
        .iter()
        .copied()
        .chain(Some((EOI_NAME, "")))
        .peekable();

    loop {
        let state = *states.last().unwrap();
        let (lookahead, text) = *input.peek().unwrap();

        if lookahead == EOI_NAME && states.len() == 2 && Some(state) == accept_state {
            return Ok(values.pop().unwrap());
        }

        match table.action(state, lookahead) {
            Some(ExportAction::Shift(next)) => {
                states.push(*next);
                values.push(Value::Token(text.to_owned()));
                input.next();
            }
            Some(ExportAction::Reduce(reduce)) => {
                let children = values.split_off(values.len() - reduce.cnt);
                states.truncate(states.len() - reduce.cnt);
                let value = reduce_value(g, table, reduce.production_id, children);
                let top = *states.last().unwrap();
                let next = table
                    .goto(top, &reduce.non_term)
                    .ok_or_else(|| format!("missing goto({}, {})", top, reduce.non_term))?;
                states.push(next);
                values.push(value);
            }
            None => return Err(format!("unexpected token `{}' in state {}", lookahead, state)),
        }
    }
}

fn reduce_value(g: &Grammar, table: &ExportedTable, id: usize, mut children: Vec<Value>) -> Value {
    if let Some(index) = table.inline_index(id) {
        return children.swap_remove(index);
    }

    let (class_name, name) = &table.production_names[id];
    let production = g
        .productions
        .values()
        .find(|p| p.qualified_name(g) == (class_name.as_str(), name.as_str()))
        .unwrap();

    match production.list_role {
        Some(ListRole::Singleton) => {
            let element = children.pop().unwrap();
            Value::List(reduce_element(element.into_option()))
        }
        Some(ListRole::Extension) => {
            let element = children.pop().unwrap();
            let list = match children.swap_remove(0) {
                Value::List(items) => items,
                value => panic!("not a list: {:?}", value),
            };
            Value::List(reduce_list(list, element.into_option()))
        }
        None if children.is_empty() => Value::Empty,
        None => Value::Node {
            production: name.clone(),
            children,
        },
    }
}
