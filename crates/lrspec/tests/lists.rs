use lrspec::{
    compiler::Config,
    export::export,
    grammar::{Grammar, ProductionDecl, SymbolID::*, TokenDecl},
    list::ListDecl,
};
use support::{parse, Value};

mod support;

fn items(value: &Value) -> Vec<String> {
    match value {
        Value::List(items) => items.iter().map(Value::sexp).collect(),
        value => panic!("not a list: {:?}", value),
    }
}

#[test]
fn separated_list_keeps_source_order() {
    let g = Grammar::define(|g| {
        let ident = g.token(TokenDecl::new("T_IDENT").lex_name("ident"))?;
        let comma = g.token(TokenDecl::new("T_COMMA").lex_name(","))?;
        let name = g.nonterminal("Name")?;
        g.production(name, ProductionDecl::new([T(ident)]).inline(0))?;
        let names = g.list_nonterminal(ListDecl::new("Names", N(name)).separator(T(comma)))?;
        g.start_symbol(names)?;
        Ok(())
    })
    .unwrap();
    let table = export(&Config::new().compile(&g).unwrap());

    let value = parse(
        &g,
        &table,
        &[("ident", "a"), (",", ","), ("ident", "b"), (",", ","), ("ident", "c")],
    )
    .unwrap();
    assert_eq!(items(&value), ["a", "b", "c"]);

    let value = parse(&g, &table, &[("ident", "a")]).unwrap();
    assert_eq!(items(&value), ["a"]);

    assert!(parse(&g, &table, &[]).is_err());
    assert!(parse(&g, &table, &[("ident", "a"), (",", ",")]).is_err());
}

#[test]
fn unseparated_list() {
    let g = Grammar::define(|g| {
        let word = g.token(TokenDecl::new("T_WORD").lex_name("word"))?;
        g.list_nonterminal(ListDecl::new("Words", T(word)))?;
        Ok(())
    })
    .unwrap();
    let table = export(&Config::new().compile(&g).unwrap());

    let value = parse(&g, &table, &[("word", "x"), ("word", "y"), ("word", "z")]).unwrap();
    assert_eq!(items(&value), ["x", "y", "z"]);
}

#[test]
fn empty_elements_contribute_nothing() {
    let (g, table) = support::load("items");

    let value = parse(
        &g,
        &table,
        &[("item", "1"), (",", ","), ("item", "2"), (",", ","), ("item", "3")],
    )
    .unwrap();
    assert_eq!(items(&value), ["1", "2", "3"]);

    let value = parse(&g, &table, &[("item", "1")]).unwrap();
    assert_eq!(items(&value), ["1"]);

    let value = parse(&g, &table, &[]).unwrap();
    assert!(items(&value).is_empty());

    let value = parse(&g, &table, &[(",", ","), ("item", "2"), (",", ",")]).unwrap();
    assert_eq!(items(&value), ["2"]);
}

#[test]
fn nested_lists() {
    let (g, table) = support::load("json");
    let tokens = [
        ("{", "{"),
        ("string", "a"),
        (":", ":"),
        ("[", "["),
        ("number", "1"),
        (",", ","),
        ("number", "2"),
        ("]", "]"),
        (",", ","),
        ("string", "b"),
        (":", ":"),
        ("{", "{"),
        ("}", "}"),
        ("}", "}"),
    ];
    let value = parse(&g, &table, &tokens).unwrap();
    assert_eq!(
        value.sexp(),
        "(reduce_object { [(reduce_STRING_COLON_Value a : (reduce_array [ [(reduce_NUMBER 1) (reduce_NUMBER 2)] ])) \
         (reduce_STRING_COLON_Value b : (reduce_empty_object { }))] })"
    );
}
