use lrspec::{
    compiler::Config,
    export::{export, ExportAction},
    grammar::{Grammar, ProductionDecl, SymbolID::*},
};
use support::parse;

mod support;

fn lex(source: &str) -> Vec<(&str, &str)> {
    source
        .split_whitespace()
        .map(|word| match word.parse::<i64>() {
            Ok(..) => ("num", word),
            Err(..) => (word, word),
        })
        .collect()
}

#[test]
fn num_plus_expr() {
    let g = Grammar::define(|g| {
        let num = g.token("T_NUM")?;
        let plus = g.token("T_PLUS")?;
        let e = g.nonterminal("Expr")?;
        g.production(e, ProductionDecl::new([T(num)]))?;
        g.production(e, ProductionDecl::new([N(e), T(plus), T(num)]))?;
        Ok(())
    })
    .unwrap();
    let spec = Config::new().compile(&g).unwrap();
    assert!(spec.is_pure_lr());
    let table = export(&spec);

    assert_eq!(table.start, "Expr");
    assert!(table.actions[0]
        .iter()
        .any(|(name, action)| name == "NUM" && matches!(action, ExportAction::Shift(..))));
    assert_eq!(table.production_names.len(), 2);

    let value = parse(
        &g,
        &table,
        &[("NUM", "1"), ("PLUS", "+"), ("NUM", "2"), ("PLUS", "+"), ("NUM", "3")],
    )
    .unwrap();
    assert_eq!(
        value.sexp(),
        "(reduce_Expr_PLUS_NUM (reduce_Expr_PLUS_NUM (reduce_NUM 1) + 2) + 3)"
    );
}

#[test]
fn precedence_and_associativity() {
    let (g, table) = support::load("arithmetic_prec");
    let eval = |source: &str| parse(&g, &table, &lex(source)).unwrap().sexp();

    assert_eq!(eval("1 + 2 * 3"), "(reduce_add 1 + (reduce_mul 2 * 3))");
    assert_eq!(eval("1 * 2 + 3"), "(reduce_add (reduce_mul 1 * 2) + 3)");
    assert_eq!(eval("1 - 2 - 3"), "(reduce_sub (reduce_sub 1 - 2) - 3)");
    assert_eq!(eval("2 ^ 3 ^ 2"), "(reduce_pow 2 ^ (reduce_pow 3 ^ 2))");
    assert_eq!(eval("- 2 ^ 2"), "(reduce_neg - (reduce_pow 2 ^ 2))");
    assert_eq!(eval("- 2 * 3"), "(reduce_mul (reduce_neg - 2) * 3)");
    assert_eq!(eval("( 1 + 2 ) * 3"), "(reduce_mul (reduce_add 1 + 2) * 3)");
}

#[test]
fn layered_grammar_agrees() {
    let (prec_g, prec_table) = support::load("arithmetic_prec");
    let (g, table) = support::load("arithmetic");
    for source in ["1 + 2 * 3", "1 - 2 - 3", "( 1 + 2 ) / 3", "1 * ( 2 - 3 ) * 4"] {
        assert_eq!(
            parse(&g, &table, &lex(source)).unwrap(),
            parse(&prec_g, &prec_table, &lex(source)).unwrap(),
            "{}",
            source
        );
    }
    assert!(parse(&g, &table, &lex("1 +")).is_err());
}

#[test]
fn dangling_else_binds_inner() {
    let (g, table) = support::load("dangling_else");
    let value = parse(
        &g,
        &table,
        &lex("if cond then if cond then other else other"),
    )
    .unwrap();
    assert_eq!(
        value.sexp(),
        "(reduce_if if cond then (reduce_if_else if cond then other else other))"
    );
}

#[test]
fn cached_compilation_exports_the_same_table() {
    let dir = std::env::temp_dir().join(format!("lrspec-e2e-cache-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let (g, table) = support::load("json");

    let mut config = Config::new();
    config.cache_path(dir.join("json.spec.json")).skinny(true);
    let compiled = export(&config.compile_cached(&g).unwrap());
    let reloaded = export(&config.load_cached(&g).unwrap());
    assert_eq!(compiled, table);
    assert_eq!(reloaded, table);
}
