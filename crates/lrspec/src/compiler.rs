//! Compilation of declared grammars into LR specs.

use crate::{
    engine::{CanonicalLR1, Engine},
    grammar::Grammar,
    spec::{Automaton, CompiledSpec},
};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    hash::Hasher,
    io,
    path::{Path, PathBuf},
    time::Instant,
};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The cached spec cannot be reused for the grammar. Recompile from scratch.
    #[error("incompatible spec: {}", reason)]
    Incompatible { reason: String },

    #[error("IO error: {}", _0)]
    Io(#[from] io::Error),

    #[error("failed to encode the compiled spec: {}", _0)]
    Cache(#[from] serde_json::Error),
}

impl CompileError {
    fn incompatible(reason: impl Into<String>) -> Self {
        Self::Incompatible {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    verbose: bool,
    skinny: bool,
    log_path: Option<PathBuf>,
    cache_path: Option<PathBuf>,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            verbose: false,
            skinny: false,
            log_path: None,
            cache_path: None,
        }
    }

    /// Emit a human-readable trace of the compiled automaton.
    pub fn verbose(&mut self, enabled: bool) -> &mut Self {
        self.verbose = enabled;
        self
    }

    /// Omit the kernel items of each state from the compiled spec.
    pub fn skinny(&mut self, enabled: bool) -> &mut Self {
        self.skinny = enabled;
        self
    }

    /// Set the file that receives the verbose trace.
    pub fn log_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.log_path = Some(path.into());
        self
    }

    /// Set the file used to persist compiled automata.
    pub fn cache_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn compile<'g>(&self, g: &'g Grammar) -> Result<CompiledSpec<'g>, CompileError> {
        self.compile_with(&CanonicalLR1, g)
    }

    pub fn compile_with<'g, E>(
        &self,
        engine: &E,
        g: &'g Grammar,
    ) -> Result<CompiledSpec<'g>, CompileError>
    where
        E: Engine + ?Sized,
    {
        let _entered = tracing::debug_span!("compile", engine = engine.name()).entered();

        let s = Instant::now();
        let automaton = engine.build(g, self.skinny);
        tracing::info!(
            "build automaton: {} states, {:?} elapsed",
            automaton.states.len(),
            s.elapsed()
        );

        let spec = CompiledSpec::new(g, automaton);
        self.report(&spec)?;
        Ok(spec)
    }

    pub fn load_cached<'g>(&self, g: &'g Grammar) -> Result<CompiledSpec<'g>, CompileError> {
        self.load_cached_with(&CanonicalLR1, g)
    }

    /// Load the spec cached for this grammar.
    ///
    /// Fails with [`CompileError::Incompatible`] unless the cache exists and was
    /// produced from the same grammar, engine and options.
    pub fn load_cached_with<'g, E>(
        &self,
        engine: &E,
        g: &'g Grammar,
    ) -> Result<CompiledSpec<'g>, CompileError>
    where
        E: Engine + ?Sized,
    {
        let path = self
            .cache_path
            .as_deref()
            .ok_or_else(|| CompileError::incompatible("no cache file is configured"))?;

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(CompileError::incompatible(format!(
                    "cache file {} does not exist",
                    path.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };
        let cached: CachedSpec = serde_json::from_str(&content).map_err(|err| {
            CompileError::incompatible(format!("malformed cache file {}: {}", path.display(), err))
        })?;

        let expected = fingerprint(g, engine, self.skinny);
        if cached.fingerprint != expected {
            return Err(CompileError::incompatible(format!(
                "fingerprint mismatch (expected {}, found {})",
                expected, cached.fingerprint
            )));
        }

        tracing::debug!("reuse the cached spec at {}", path.display());
        let spec = CompiledSpec::new(g, cached.automaton);
        self.report(&spec)?;
        Ok(spec)
    }

    pub fn compile_cached<'g>(&self, g: &'g Grammar) -> Result<CompiledSpec<'g>, CompileError> {
        self.compile_cached_with(&CanonicalLR1, g)
    }

    /// Load the cached spec, or compile the grammar and refresh the cache when
    /// the cached one is incompatible.
    pub fn compile_cached_with<'g, E>(
        &self,
        engine: &E,
        g: &'g Grammar,
    ) -> Result<CompiledSpec<'g>, CompileError>
    where
        E: Engine + ?Sized,
    {
        let path = match &self.cache_path {
            Some(path) => path,
            None => return self.compile_with(engine, g),
        };

        match self.load_cached_with(engine, g) {
            Ok(spec) => Ok(spec),
            Err(CompileError::Incompatible { reason }) => {
                tracing::info!("recompile the grammar: {}", reason);
                let spec = self.compile_with(engine, g)?;
                store_cache(path, &fingerprint(g, engine, self.skinny), spec.automaton())?;
                Ok(spec)
            }
            Err(err) => Err(err),
        }
    }

    fn report(&self, spec: &CompiledSpec<'_>) -> Result<(), CompileError> {
        let g = spec.grammar();
        for (state, t, action) in spec.conflicts() {
            tracing::warn!(
                "unresolved conflict in state {} on `{}': {:?}",
                state,
                g.terminals[&t].name,
                action
            );
        }

        if self.verbose {
            let trace = format!("{}\n{}", g, spec.display());
            tracing::debug!("compiled spec:\n{}", trace);
            if let Some(path) = &self.log_path {
                fs::write(path, trace)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedSpec {
    fingerprint: String,
    automaton: Automaton,
}

fn store_cache(path: &Path, fingerprint: &str, automaton: &Automaton) -> Result<(), CompileError> {
    #[derive(Serialize)]
    struct CachedSpecRef<'a> {
        fingerprint: &'a str,
        automaton: &'a Automaton,
    }
    let content = serde_json::to_string(&CachedSpecRef {
        fingerprint,
        automaton,
    })?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Compute the key identifying the automaton built from the grammar.
///
/// It covers the canonical grammar text, the engine and the skinny flag.
pub fn fingerprint<E>(g: &Grammar, engine: &E, skinny: bool) -> String
where
    E: Engine + ?Sized,
{
    let mut hasher = FxHasher::default();
    hasher.write(g.to_string().as_bytes());
    hasher.write(engine.name().as_bytes());
    hasher.write_u32(engine.version());
    hasher.write_u8(skinny as u8);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        export::export,
        grammar::{ProductionDecl, SymbolID::*},
        precedence::{Assoc, FamilyID, PrecedenceDecl, Relation},
    };
    use std::env;

    fn grammar(with_minus: bool) -> Grammar {
        Grammar::define(|g| {
            let num = g.token("T_NUM")?;
            let plus = g.token("T_PLUS")?;
            let e = g.nonterminal("Expr")?;
            g.production(e, ProductionDecl::new([N(e), T(plus), T(num)]))?;
            g.production(e, ProductionDecl::new([T(num)]))?;
            if with_minus {
                let minus = g.token("T_MINUS")?;
                g.production(e, ProductionDecl::new([N(e), T(minus), T(num)]))?;
            }
            Ok(())
        })
        .unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("lrspec-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn fingerprint_tracks_inputs() {
        let g1 = grammar(false);
        let g2 = grammar(true);
        let fp = fingerprint(&g1, &CanonicalLR1, false);
        assert_eq!(fp, fingerprint(&grammar(false), &CanonicalLR1, false));
        assert_ne!(fp, fingerprint(&g2, &CanonicalLR1, false));
        assert_ne!(fp, fingerprint(&g1, &CanonicalLR1, true));
    }

    fn ordered_grammar(assoc: Assoc, relation: Relation) -> Grammar {
        Grammar::define(|g| {
            g.precedences().declare(
                FamilyID::DEFAULT,
                PrecedenceDecl::left("P_MUL").tokens(["STAR"]),
            )?;
            g.precedences().declare(
                FamilyID::DEFAULT,
                PrecedenceDecl::new("P_ADD", assoc)
                    .relation(relation)
                    .tokens(["PLUS"])
                    .grammar_text("%add"),
            )?;
            let num = g.token("T_NUM")?;
            let plus = g.token("T_PLUS")?;
            let star = g.token("T_STAR")?;
            let e = g.nonterminal("Expr")?;
            g.production(e, ProductionDecl::new([N(e), T(plus), N(e)]))?;
            g.production(e, ProductionDecl::new([N(e), T(star), N(e)]))?;
            g.production(e, ProductionDecl::new([T(num)]))?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn fingerprint_tracks_precedence_order() {
        let fp = fingerprint(
            &ordered_grammar(Assoc::Left, Relation::Less),
            &CanonicalLR1,
            false,
        );
        assert_ne!(
            fp,
            fingerprint(&ordered_grammar(Assoc::Right, Relation::Less), &CanonicalLR1, false)
        );
        assert_ne!(
            fp,
            fingerprint(&ordered_grammar(Assoc::Left, Relation::Greater), &CanonicalLR1, false)
        );
    }

    #[test]
    fn cache_rejects_changed_associativity() {
        let dir = temp_dir("assoc-cache");
        let mut config = Config::new();
        config.cache_path(dir.join("spec.json"));
        config
            .compile_cached(&ordered_grammar(Assoc::Left, Relation::Less))
            .unwrap();

        let right = ordered_grammar(Assoc::Right, Relation::Less);
        let err = config.load_cached(&right).unwrap_err();
        assert!(matches!(err, CompileError::Incompatible { .. }));

        let cached = config.compile_cached(&right).unwrap();
        let fresh = Config::new().compile(&right).unwrap();
        assert_eq!(export(&cached), export(&fresh));
    }

    #[test]
    fn missing_cache_is_incompatible() {
        let g = grammar(false);
        let err = Config::new().load_cached(&g).unwrap_err();
        assert!(matches!(err, CompileError::Incompatible { .. }));

        let dir = temp_dir("missing-cache");
        let err = Config::new()
            .cache_path(dir.join("spec.json"))
            .load_cached(&g)
            .unwrap_err();
        assert!(matches!(err, CompileError::Incompatible { .. }));
    }

    #[test]
    fn cache_roundtrip_and_invalidation() {
        let dir = temp_dir("cache");
        let cache = dir.join("spec.json");
        let mut config = Config::new();
        config.cache_path(&cache);

        let g = grammar(false);
        let compiled = config.compile_cached(&g).unwrap();
        assert!(cache.exists());
        let loaded = config.load_cached(&g).unwrap();
        assert_eq!(
            compiled.automaton().states.len(),
            loaded.automaton().states.len()
        );
        for (id, state) in compiled.states() {
            assert_eq!(state.actions, loaded.automaton().states[&id].actions);
            assert_eq!(state.gotos, loaded.automaton().states[&id].gotos);
        }

        let changed = grammar(true);
        let err = config.load_cached(&changed).unwrap_err();
        assert!(
            matches!(err, CompileError::Incompatible { reason } if reason.contains("fingerprint"))
        );

        let recompiled = config.compile_cached(&changed).unwrap();
        assert!(recompiled.is_pure_lr());
        assert!(config.load_cached(&changed).is_ok());
        assert!(config.load_cached(&g).is_err());
    }

    #[test]
    fn malformed_cache_is_incompatible() {
        let dir = temp_dir("malformed-cache");
        let cache = dir.join("spec.json");
        fs::write(&cache, "{\"fingerprint\": 42").unwrap();
        let err = Config::new()
            .cache_path(&cache)
            .load_cached(&grammar(false))
            .unwrap_err();
        assert!(matches!(err, CompileError::Incompatible { .. }));
    }

    #[test]
    fn verbose_writes_trace() {
        let dir = temp_dir("verbose");
        let log = dir.join("grammar.log");
        let g = grammar(false);

        Config::new().log_path(&log).compile(&g).unwrap();
        assert!(!log.exists());

        Config::new().verbose(true).log_path(&log).compile(&g).unwrap();
        let trace = fs::read_to_string(&log).unwrap();
        assert!(trace.contains("#### tokens:"));
        assert!(trace.contains("#### State S#000"));
        assert!(trace.contains("Expr -> Expr PLUS NUM"));
    }
}
