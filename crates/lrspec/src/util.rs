use std::fmt;

pub fn display_fn(f: impl Fn(&mut fmt::Formatter<'_>) -> fmt::Result) -> impl fmt::Display {
    DisplayFn(f)
}

struct DisplayFn<F>(F);
impl<F> fmt::Display for DisplayFn<F>
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.0)(formatter)
    }
}

/// Verify that `s` is usable as a symbol name in grammar texts and exported tables.
pub(crate) fn verify_ident(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        // The number must not be identifer.
        return false;
    }

    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || unicode_ident::is_xid_start(first)) {
        return false;
    }
    chars.all(unicode_ident::is_xid_continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_ident() {
        assert!(verify_ident("NUM"));
        assert!(verify_ident("_private"));
        assert!(verify_ident("Expr2"));
        assert!(verify_ident("識別子"));
        assert!(!verify_ident(""));
        assert!(!verify_ident("123"));
        assert!(!verify_ident("2x"));
        assert!(!verify_ident("<$>"));
        assert!(!verify_ident("a-b"));
    }
}
