//! Build script support.
//!
//! Every `*.grammar.json` file under the crate root is compiled, and its table
//! is written to `$OUT_DIR` at the same relative path as `*.table.json`.

use crate::{compiler::Config, export::export, grammar::Grammar};
use anyhow::Context as _;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

const GRAMMAR_SUFFIX: &str = ".grammar.json";

pub fn process_root() -> anyhow::Result<()> {
    let build = Build::new()?;
    build.process()
}

pub fn process_dir(root_dir: &Path) -> anyhow::Result<()> {
    let build = Build::with_root_dir(root_dir.to_owned())?;
    build.process()
}

#[derive(Debug)]
pub struct Build {
    root_dir: PathBuf,
    out_dir: PathBuf,
    config: Config,
}

impl Build {
    pub fn new() -> anyhow::Result<Self> {
        let root_dir = env::var_os("CARGO_MANIFEST_DIR")
            .map(PathBuf::from)
            .context("The environment variable `CARGO_MANIFEST_DIR' is not set")?;
        Self::with_root_dir(root_dir)
    }

    pub fn with_root_dir(root_dir: PathBuf) -> anyhow::Result<Self> {
        let out_dir = env::var_os("OUT_DIR")
            .map(PathBuf::from)
            .context("The environment variable `OUT_DIR' is not set")?;
        Ok(Self::with_dirs(root_dir, out_dir))
    }

    pub fn with_dirs(root_dir: PathBuf, out_dir: PathBuf) -> Self {
        Self {
            root_dir,
            out_dir,
            config: Config::new(),
        }
    }

    /// The compiler options applied to every grammar.
    ///
    /// With verbose mode, the trace of each grammar is written next to it as `*.grammar.log`.
    pub fn config(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn process(&self) -> anyhow::Result<()> {
        for entry in WalkDir::new(&self.root_dir).sort_by_file_name() {
            let entry = entry.context("from WalkDir entry")?;
            if !entry.file_type().is_file() {
                continue;
            }
            let in_file = entry.path();
            match in_file.file_name().and_then(|name| name.to_str()) {
                Some(name) if name.ends_with(GRAMMAR_SUFFIX) => self.process_file(in_file)?,
                _ => continue,
            }
        }

        Ok(())
    }

    fn process_file(&self, in_file: &Path) -> anyhow::Result<()> {
        let _entered = tracing::info_span!("process_file", path = %in_file.display()).entered();

        let rel_path = in_file.strip_prefix(&self.root_dir)?;
        let out_file = self.out_dir.join(with_suffix(rel_path, ".table.json"));
        if let Some(out_dir) = out_file.parent() {
            fs::create_dir_all(out_dir)?;
        }

        println!("cargo:rerun-if-changed={}", in_file.display());

        let grammar = Grammar::from_file(in_file)
            .with_context(|| format!("failed to read the grammar {}", in_file.display()))?;

        let mut config = self.config.clone();
        config.log_path(with_suffix(in_file, ".grammar.log"));
        let spec = config.compile(&grammar)?;
        if !spec.is_pure_lr() {
            let conflicts: Vec<_> = spec
                .conflicts()
                .map(|(state, t, _)| format!("{}:{}", state, grammar.terminals[&t].name))
                .collect();
            anyhow::bail!(
                "the grammar {} has unresolved conflicts at {}",
                in_file.display(),
                conflicts.join(", ")
            );
        }

        let table = export(&spec);
        fs::write(&out_file, table.to_json()?)
            .with_context(|| format!("failed to write {}", out_file.display()))?;

        Ok(())
    }
}

/// Replace the `.grammar.json` suffix of the file name.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(GRAMMAR_SUFFIX))
        .unwrap_or_default();
    path.with_file_name(format!("{}{}", name, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_replacement() {
        assert_eq!(
            with_suffix(Path::new("src/calc.grammar.json"), ".table.json"),
            Path::new("src/calc.table.json")
        );
        assert_eq!(
            with_suffix(Path::new("calc.grammar.json"), ".grammar.log"),
            Path::new("calc.grammar.log")
        );
    }

    #[test]
    fn process_tree() {
        let root = env::temp_dir().join(format!("lrspec-build-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let src = root.join("src").join("nested");
        let out = root.join("out");
        fs::create_dir_all(&src).unwrap();
        fs::write(
            src.join("unit.grammar.json"),
            r#"{
                "tokens": [ { "class": "T_UNIT" } ],
                "nonterminals": [ { "name": "Unit", "productions": [ { "rhs": ["UNIT"] } ] } ]
            }"#,
        )
        .unwrap();
        fs::write(src.join("ignored.json"), "{}").unwrap();

        Build::with_dirs(root.join("src"), out.clone())
            .process()
            .unwrap();

        let table = fs::read_to_string(out.join("nested").join("unit.table.json")).unwrap();
        assert!(table.contains(r#""start":"Unit""#));
        assert!(!out.join("nested").join("ignored.table.json").exists());
    }
}
