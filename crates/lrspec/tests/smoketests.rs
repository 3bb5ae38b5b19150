use lrspec::{compiler::Config, export::export, grammar::Grammar};

mod support;

macro_rules! define_tests {
    ($($name:ident),*$(,)?) => {$(
        #[test]
        fn $name() {
            let grammar = Grammar::from_file(support::grammar_path(stringify!($name))).unwrap();
            let spec = Config::new().compile(&grammar).unwrap();
            assert!(spec.is_pure_lr(), "{}", spec.display());

            let first = export(&spec).to_json().unwrap();
            let second = export(&spec).to_json().unwrap();
            assert_eq!(first, second);

            let skinny = Config::new().skinny(true).compile(&grammar).unwrap();
            assert_eq!(export(&skinny).to_json().unwrap(), first);
        }
    )*};
}

define_tests! {
    arithmetic,
    arithmetic_prec,
    dangling_else,
    items,
    json,
}
