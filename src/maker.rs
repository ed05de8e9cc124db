//! Build orchestration.
//!
//! Drives the compiler, bibtex and makeindex until the document is stable.
//!
//! # Flow
//!
//! ```text
//! run()
//!     │
//!     ├── read_latex_files()     snapshot citations, .toc digest, glossaries
//!     │
//!     ├── latex_run()            first pass, re-read glossaries
//!     │
//!     ├── makeindex_runs()       per glossary, only if its input changed
//!     │       └── latex_run()    if a glossary or the .toc changed
//!     │
//!     ├── need_bib_run()         \bibdata present and citations/.bib changed
//!     │       └── bibtex_run() + latex_run()
//!     │
//!     ├── need_latex_rerun()     rerun rules, bounded by [latex.max_runs]
//!     │
//!     └── check_cite / clean / preview / notify
//! ```

use crate::{
    auxfile::{self, CiteCounter, Glossaries},
    cmd,
    config::Config,
    error::{LatexMkError, Result},
    log,
    logger::Logger,
    preview, texlog,
    utils::exec::ToolRunner,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    ffi::OsString,
    fs,
    path::PathBuf,
};

/// State captured before the first compiler pass.
struct Snapshot {
    cite_counter: CiteCounter,
    toc: Option<blake3::Hash>,
    /// Glossary name -> content of its output file.
    gloss_files: BTreeMap<String, String>,
}

/// Runs one build of a LaTeX document.
pub struct LatexMaker<'a, R: ToolRunner> {
    config: &'a Config,
    log: &'a Logger,
    runner: R,
    root: PathBuf,
    name: String,

    /// Content of the latest compiler log.
    out: String,
    glossaries: Glossaries,
    latex_run_counter: usize,
    /// Bibliography source named by `\bibdata`, without `.bib`.
    bib_file: Option<String>,
}

impl<'a, R: ToolRunner> LatexMaker<'a, R> {
    pub fn new(config: &'a Config, name: impl Into<String>, log: &'a Logger, runner: R) -> Self {
        Self {
            config,
            log,
            runner,
            root: config.root.clone(),
            name: name.into(),
            out: String::new(),
            glossaries: Glossaries::new(),
            latex_run_counter: 0,
            bib_file: None,
        }
    }

    /// Number of compiler passes so far.
    #[cfg(test)]
    pub const fn latex_runs(&self) -> usize {
        self.latex_run_counter
    }

    #[inline]
    fn file(&self, ext: &str) -> String {
        format!("{}.{ext}", self.name)
    }

    #[inline]
    fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    fn read(&self, file: &str) -> Result<String> {
        let path = self.path(file);
        fs::read_to_string(&path).map_err(|err| LatexMkError::io(path, err))
    }

    // ========================================================================
    // Run
    // ========================================================================

    /// Build the document.
    ///
    /// # Errors
    /// Fails if an external tool cannot be started, if a file the build
    /// depends on cannot be read, or if the compiler log reports errors
    /// while `[behavior.exit_on_error]` is set.
    pub fn run(&mut self) -> Result<()> {
        let config = self.config;
        let behavior = &config.behavior;

        let old_dir = if behavior.clean {
            Some(self.list_dir()?)
        } else {
            None
        };

        let snapshot = self.read_latex_files()?;

        self.latex_run()?;
        self.read_glossaries();

        let gloss_changed = self.makeindex_runs(&snapshot.gloss_files)?;
        if gloss_changed || self.is_toc_changed(snapshot.toc) {
            self.latex_run()?;
        }

        if self.need_bib_run(&snapshot.cite_counter)? {
            self.bibtex_run()?;
            self.latex_run()?;
        }

        while self.latex_run_counter < config.latex.max_runs && self.need_latex_rerun() {
            self.latex_run()?;
        }

        if behavior.check_cite {
            self.check_cite();
        }

        if let Some(old_dir) = old_dir {
            self.clean(&old_dir)?;
        }

        if behavior.preview {
            let file = self.file(config.latex.output_ext());
            let viewer = config.tools.viewer.as_deref();
            preview::open_preview(&mut self.runner, &self.root, viewer, &file, self.log);
        }

        let msg = format!("'{}.tex' compiled", self.name);
        log!(self.log, Info, "latexmake"; "{msg}");
        if behavior.notify {
            self.log.notify(&msg);
        }

        Ok(())
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    /// Capture the state of a previous build before the first pass.
    fn read_latex_files(&mut self) -> Result<Snapshot> {
        let aux = self.file("aux");
        let cite_counter = if self.path(&aux).is_file() {
            self.read_glossaries();
            auxfile::citation_counter(&self.root, &aux)?
        } else {
            auxfile::empty_counter(&aux)
        };

        let gloss_files = self
            .glossaries
            .iter()
            .filter_map(|(name, gloss)| {
                let content = fs::read_to_string(self.path(&gloss.output_file(&self.name))).ok()?;
                Some((name.clone(), content))
            })
            .collect();

        Ok(Snapshot {
            cite_counter,
            toc: self.toc_digest(),
            gloss_files,
        })
    }

    fn toc_digest(&self) -> Option<blake3::Hash> {
        fs::read(self.path(&self.file("toc")))
            .ok()
            .map(|bytes| blake3::hash(&bytes))
    }

    /// Whether the `.toc` exists and differs from the snapshot.
    fn is_toc_changed(&self, old: Option<blake3::Hash>) -> bool {
        self.toc_digest().is_some_and(|new| Some(new) != old)
    }

    /// Re-derive the glossary registry from the main aux file.
    fn read_glossaries(&mut self) {
        self.glossaries = fs::read_to_string(self.path(&self.file("aux")))
            .map(|content| auxfile::parse_glossaries(&content))
            .unwrap_or_default();
    }

    // ========================================================================
    // Compiler
    // ========================================================================

    /// Run one compiler pass and scan its log.
    fn latex_run(&mut self) -> Result<()> {
        let latex = &self.config.latex;
        let latex_cmd = latex.effective_command();
        log!(self.log, Info, "latex"; "Running {latex_cmd}...");

        let mut cmd = cmd![latex_cmd];
        cmd.extend(latex.flags.iter().map(OsString::from));
        cmd.extend(cmd!["-jobname", &self.name, self.file("tex")]);

        self.runner.run(&self.root, &cmd)?;
        self.latex_run_counter += 1;

        let log_file = self.path(&self.file("log"));
        let bytes = fs::read(&log_file).map_err(|err| LatexMkError::io(log_file, err))?;
        self.out = String::from_utf8_lossy(&bytes).into_owned();

        self.check_errors()
    }

    /// Report errors found in the latest log.
    fn check_errors(&self) -> Result<()> {
        let errors = texlog::find_errors(&self.out);
        if errors.is_empty() {
            return Ok(());
        }

        let error = errors.join("\n");
        let hint = format!("See \"{}\" for details.", self.file("log"));

        log!(self.log, Error, "error"; "! Errors occurred:");
        log!(self.log, Error, "error"; "{error}");
        log!(self.log, Error, "error"; "! {hint}");

        if self.config.behavior.exit_on_error {
            return Err(LatexMkError::Compile(format!("{error}\n{hint}")));
        }
        Ok(())
    }

    /// Whether the latest log asks for another pass.
    fn need_latex_rerun(&self) -> bool {
        match texlog::needs_rerun(&self.out) {
            Some(rule) => {
                log!(self.log, Debug, "latex"; "rerun needed: {}", rule.name);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Glossaries
    // ========================================================================

    /// Run makeindex for every glossary whose input changed.
    ///
    /// Returns `true` if makeindex was called.
    fn makeindex_runs(&mut self, gloss_files: &BTreeMap<String, String>) -> Result<bool> {
        let mut gloss_changed = false;

        for (gloss, glossary) in &self.glossaries {
            let fname_in = glossary.input_file(&self.name);
            let fname_out = glossary.output_file(&self.name);

            let make_gloss = texlog::reports_missing_file(&self.out, &fname_in)
                || match fs::read_to_string(self.path(&fname_out)) {
                    Err(_) => true,
                    Ok(current) => gloss_files.get(gloss) != Some(&current),
                };

            if make_gloss {
                log!(self.log, Info, "makeindex"; "Running makeindex ({gloss})...");
                let cmd = cmd![
                    &self.config.tools.makeindex,
                    "-q",
                    "-s",
                    self.file("ist"),
                    "-o",
                    &fname_in,
                    &fname_out,
                ];
                self.runner.run(&self.root, &cmd)?;
                gloss_changed = true;
            }
        }

        Ok(gloss_changed)
    }

    // ========================================================================
    // Bibliography
    // ========================================================================

    /// Decide whether bibtex has to run.
    ///
    /// 1. The aux file names a bibliography source that exists.
    /// 2. The log reports a missing `.bbl` or an undefined citation.
    /// 3. The citations changed during the first pass.
    /// 4. The bibliography source changed since the last bibtex run.
    fn need_bib_run(&mut self, old_cite_counter: &CiteCounter) -> Result<bool> {
        let aux = self.file("aux");
        let Ok(content) = fs::read_to_string(self.path(&aux)) else {
            return Ok(false);
        };
        let Some(bib_file) = auxfile::bib_data(&content) else {
            return Ok(false);
        };
        self.bib_file = Some(bib_file.clone());

        let bib = self.path(&format!("{bib_file}.bib"));
        if !bib.is_file() {
            log!(self.log, Warn, "bibtex"; "Could not find *.bib file.");
            return Ok(false);
        }

        if texlog::reports_missing_file(&self.out, &self.file("bbl"))
            || texlog::reports_undefined_citation(&self.out)
        {
            return Ok(true);
        }

        if *old_cite_counter != auxfile::citation_counter(&self.root, &aux)? {
            return Ok(true);
        }

        let old = self.path(&format!("{bib_file}.bib.old"));
        if old.is_file() {
            let new_bytes = fs::read(&bib).map_err(|err| LatexMkError::io(&bib, err))?;
            let old_bytes = fs::read(&old).map_err(|err| LatexMkError::io(&old, err))?;
            return Ok(new_bytes != old_bytes);
        }

        Ok(false)
    }

    /// Run bibtex and remember the bibliography source it saw.
    fn bibtex_run(&mut self) -> Result<()> {
        log!(self.log, Info, "bibtex"; "Running bibtex...");
        let cmd = cmd![&self.config.tools.bibtex, &self.name];
        self.runner.run(&self.root, &cmd)?;

        if let Some(bib_file) = &self.bib_file {
            let new = self.path(&format!("{bib_file}.bib"));
            let old = self.path(&format!("{bib_file}.bib.old"));
            fs::copy(&new, &old).map_err(|err| LatexMkError::io(old, err))?;
        }
        Ok(())
    }

    /// Log bibliography entries that are never cited.
    fn check_cite(&self) {
        let Some(bib_file) = &self.bib_file else {
            log!(self.log, Warn, "check-cite"; "No bibliography found, skipping citation check.");
            return;
        };

        let (Ok(aux), Ok(bib)) = (self.read(&self.file("aux")), self.read(&format!("{bib_file}.bib")))
        else {
            log!(self.log, Warn, "check-cite"; "Could not read {bib_file}.bib, skipping citation check.");
            return;
        };

        for name in auxfile::uncited_entries(&aux, &bib) {
            log!(self.log, Info, "check-cite"; "Bib entry not cited: \"{name}\"");
        }
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    fn list_dir(&self) -> Result<BTreeSet<OsString>> {
        let entries = fs::read_dir(&self.root).map_err(|err| LatexMkError::io(&self.root, err))?;
        Ok(entries.filter_map(|e| e.ok()).map(|e| e.file_name()).collect())
    }

    /// Remove files created during the run, except the final document.
    fn clean(&self, old_dir: &BTreeSet<OsString>) -> Result<()> {
        let ending = format!(".{}", self.config.latex.output_ext());

        for entry in fs::read_dir(&self.root)
            .map_err(|err| LatexMkError::io(&self.root, err))?
            .filter_map(|e| e.ok())
        {
            let fname = entry.file_name();
            let keep = old_dir.contains(&fname)
                || fname.to_string_lossy().ends_with(&ending)
                || !entry.file_type().is_ok_and(|t| t.is_file());
            if !keep {
                let _ = fs::remove_file(entry.path());
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Level;
    use std::path::Path;
    use tempfile::TempDir;

    const CLEAN_LOG: &str = "Output written on paper.pdf (1 page).\n";
    const UNDEFINED_REFS: &str = "LaTeX Warning: There were undefined references.\n";

    /// Files the fake compiler writes on one pass.
    #[derive(Clone, Default)]
    struct Pass {
        log: &'static str,
        aux: &'static str,
        toc: Option<&'static str>,
    }

    impl Pass {
        fn log(log: &'static str) -> Self {
            Self {
                log,
                ..Default::default()
            }
        }
    }

    /// Pretends to be the LaTeX toolchain.
    ///
    /// Compiler passes replay `passes` in order, repeating the last one.
    #[derive(Default)]
    struct ScriptedRunner {
        passes: Vec<Pass>,
        commands: Vec<Vec<String>>,
        /// Commands started without waiting (the viewer).
        spawned: Vec<Vec<String>>,
        missing: Option<&'static str>,
        latex_passes: usize,
    }

    impl ScriptedRunner {
        fn new(passes: Vec<Pass>) -> Self {
            Self {
                passes,
                ..Default::default()
            }
        }

        fn count(&self, program: &str) -> usize {
            self.commands.iter().filter(|c| c[0] == program).count()
        }
    }

    fn to_strings(cmd: &[OsString]) -> Vec<String> {
        cmd.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    impl ToolRunner for ScriptedRunner {
        fn run(&mut self, root: &Path, cmd: &[OsString]) -> Result<()> {
            let cmd = to_strings(cmd);
            if self.missing == Some(cmd[0].as_str()) {
                return Err(LatexMkError::ToolNotFound(cmd[0].clone()));
            }

            match cmd[0].as_str() {
                "pdflatex" | "latex" => {
                    let base = &cmd[cmd.iter().position(|a| a == "-jobname").unwrap() + 1];
                    let pass = &self.passes[self.latex_passes.min(self.passes.len() - 1)];
                    fs::write(root.join(format!("{base}.log")), pass.log).unwrap();
                    fs::write(root.join(format!("{base}.aux")), pass.aux).unwrap();
                    fs::write(root.join(format!("{base}.pdf")), "%PDF").unwrap();
                    if let Some(toc) = pass.toc {
                        fs::write(root.join(format!("{base}.toc")), toc).unwrap();
                    }
                    self.latex_passes += 1;
                }
                "bibtex" => fs::write(root.join(format!("{}.bbl", cmd[1])), "").unwrap(),
                "makeindex" => {
                    let out = &cmd[cmd.iter().position(|a| a == "-o").unwrap() + 1];
                    fs::write(root.join(out), "\\begin{theglossary}").unwrap();
                }
                _ => {}
            }

            self.commands.push(cmd);
            Ok(())
        }

        fn spawn(&mut self, _root: &Path, cmd: &[OsString]) -> Result<()> {
            let cmd = to_strings(cmd);
            if self.missing == Some(cmd[0].as_str()) {
                return Err(LatexMkError::ToolNotFound(cmd[0].clone()));
            }
            self.spawned.push(cmd);
            Ok(())
        }
    }

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.root = dir.to_path_buf();
        config
    }

    fn project(dir: &TempDir) {
        fs::write(dir.path().join("paper.tex"), "\\documentclass{article}").unwrap();
    }

    // ------------------------------------------------------------------------
    // Rerun loop
    // ------------------------------------------------------------------------

    #[test]
    fn test_plain_document_reruns_until_stable() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Debug);
        let runner = ScriptedRunner::new(vec![
            Pass::log(UNDEFINED_REFS),
            Pass::log(UNDEFINED_REFS),
            Pass::log(CLEAN_LOG),
        ]);

        let mut maker = LatexMaker::new(&config, "paper", &logger, runner);
        maker.run().unwrap();

        assert_eq!(maker.latex_runs(), 3);
        assert_eq!(maker.runner.count("bibtex"), 0);
        assert!(logger.contains("'paper.tex' compiled"));
    }

    #[test]
    fn test_rerun_loop_is_bounded() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);
        let runner = ScriptedRunner::new(vec![Pass::log(
            "LaTeX Warning: Label(s) may have changed.\n\
             LaTeX Warning: There were undefined references.\n\
             No file paper.toc.\n",
        )]);

        let mut maker = LatexMaker::new(&config, "paper", &logger, runner);
        maker.run().unwrap();

        assert_eq!(maker.latex_runs(), 4);
        assert_eq!(maker.runner.count("pdflatex"), 4);
    }

    #[test]
    fn test_compiler_command_line() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        let mut config = config_in(dir.path());
        config.latex.dvi = true;
        let logger = Logger::memory(Level::Info);

        let mut maker = LatexMaker::new(&config, "paper", &logger, ScriptedRunner::new(vec![Pass::log(CLEAN_LOG)]));
        maker.run().unwrap();

        assert_eq!(
            maker.runner.commands[0],
            [
                "latex",
                "-interaction=nonstopmode",
                "-shell-escape",
                "--synctex=1",
                "-jobname",
                "paper",
                "paper.tex"
            ]
        );
    }

    // ------------------------------------------------------------------------
    // Table of contents
    // ------------------------------------------------------------------------

    #[test]
    fn test_toc_change_triggers_exactly_one_pass() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        fs::write(dir.path().join("paper.toc"), "old").unwrap();
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);
        let runner = ScriptedRunner::new(vec![Pass {
            log: CLEAN_LOG,
            toc: Some("\\contentsline {section}{Intro}{1}"),
            ..Default::default()
        }]);

        let mut maker = LatexMaker::new(&config, "paper", &logger, runner);
        maker.run().unwrap();

        assert_eq!(maker.latex_runs(), 2);
    }

    #[test]
    fn test_unchanged_toc_needs_no_extra_pass() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        fs::write(dir.path().join("paper.toc"), "same").unwrap();
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);
        let runner = ScriptedRunner::new(vec![Pass {
            log: CLEAN_LOG,
            toc: Some("same"),
            ..Default::default()
        }]);

        let mut maker = LatexMaker::new(&config, "paper", &logger, runner);
        maker.run().unwrap();

        assert_eq!(maker.latex_runs(), 1);
    }

    // ------------------------------------------------------------------------
    // Glossaries
    // ------------------------------------------------------------------------

    fn maker_with_glossary<'a>(
        config: &'a Config,
        logger: &'a Logger,
    ) -> LatexMaker<'a, ScriptedRunner> {
        let mut maker = LatexMaker::new(config, "paper", logger, ScriptedRunner::default());
        maker.glossaries.insert(
            "main".into(),
            auxfile::Glossary {
                ext_in: "glo".into(),
                ext_out: "gls".into(),
            },
        );
        maker
    }

    #[test]
    fn test_makeindex_runs_when_output_missing() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);
        let mut maker = maker_with_glossary(&config, &logger);

        let changed = maker.makeindex_runs(&BTreeMap::new()).unwrap();

        assert!(changed);
        assert_eq!(
            maker.runner.commands,
            vec![["makeindex", "-q", "-s", "paper.ist", "-o", "paper.glo", "paper.gls"]]
        );
        assert!(logger.contains("Running makeindex (main)..."));
    }

    #[test]
    fn test_makeindex_skipped_when_output_unchanged() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("paper.gls"), "\\glossentry{x}").unwrap();
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);
        let mut maker = maker_with_glossary(&config, &logger);

        let snapshot = BTreeMap::from([("main".to_string(), "\\glossentry{x}".to_string())]);
        let changed = maker.makeindex_runs(&snapshot).unwrap();

        assert!(!changed);
        assert!(maker.runner.commands.is_empty());
    }

    #[test]
    fn test_makeindex_runs_when_output_changed_or_input_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("paper.gls"), "\\glossentry{y}").unwrap();
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);

        let mut maker = maker_with_glossary(&config, &logger);
        let snapshot = BTreeMap::from([("main".to_string(), "\\glossentry{x}".to_string())]);
        assert!(maker.makeindex_runs(&snapshot).unwrap());

        let mut maker = maker_with_glossary(&config, &logger);
        maker.out = "No file paper.glo.\n".into();
        let snapshot = BTreeMap::from([("main".to_string(), "\\glossentry{y}".to_string())]);
        assert!(maker.makeindex_runs(&snapshot).unwrap());
    }

    #[test]
    fn test_glossary_rebuild_triggers_pass() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);
        let runner = ScriptedRunner::new(vec![Pass {
            log: CLEAN_LOG,
            aux: "\\@newglossary{main}{glg}{gls}{glo}\n",
            toc: None,
        }]);

        let mut maker = LatexMaker::new(&config, "paper", &logger, runner);
        maker.run().unwrap();

        assert_eq!(maker.runner.count("makeindex"), 1);
        assert_eq!(maker.latex_runs(), 2);
    }

    // ------------------------------------------------------------------------
    // Bibliography
    // ------------------------------------------------------------------------

    fn bib_project(dir: &TempDir, aux: &str) {
        project(dir);
        fs::write(dir.path().join("paper.aux"), aux).unwrap();
        fs::write(dir.path().join("refs.bib"), "@book{knuth84,\n}\n").unwrap();
    }

    #[test]
    fn test_no_bib_run_when_bib_unchanged() {
        let dir = TempDir::new().unwrap();
        let aux = "\\bibdata{refs}\n\\citation{knuth84}\n";
        bib_project(&dir, aux);
        fs::copy(dir.path().join("refs.bib"), dir.path().join("refs.bib.old")).unwrap();
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);

        let mut maker = LatexMaker::new(&config, "paper", &logger, ScriptedRunner::default());
        maker.out = CLEAN_LOG.into();
        let counter = auxfile::citation_counter(dir.path(), "paper.aux").unwrap();

        assert!(!maker.need_bib_run(&counter).unwrap());
        assert_eq!(maker.bib_file.as_deref(), Some("refs"));
    }

    #[test]
    fn test_bib_run_when_bib_changed() {
        let dir = TempDir::new().unwrap();
        bib_project(&dir, "\\bibdata{refs}\n");
        fs::write(dir.path().join("refs.bib.old"), "@book{other,\n}\n").unwrap();
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);

        let mut maker = LatexMaker::new(&config, "paper", &logger, ScriptedRunner::default());
        let counter = auxfile::citation_counter(dir.path(), "paper.aux").unwrap();

        assert!(maker.need_bib_run(&counter).unwrap());
    }

    #[test]
    fn test_bib_run_on_log_hints() {
        let dir = TempDir::new().unwrap();
        bib_project(&dir, "\\bibdata{refs}\n");
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);
        let counter = auxfile::citation_counter(dir.path(), "paper.aux").unwrap();

        let mut maker = LatexMaker::new(&config, "paper", &logger, ScriptedRunner::default());
        maker.out = "No file paper.bbl.\n".into();
        assert!(maker.need_bib_run(&counter).unwrap());

        maker.out = "LaTeX Warning: Citation `knuth84' on page 1 undefined on input line 3.\n".into();
        assert!(maker.need_bib_run(&counter).unwrap());
    }

    #[test]
    fn test_bib_run_when_citations_changed() {
        let dir = TempDir::new().unwrap();
        bib_project(&dir, "\\bibdata{refs}\n\\citation{knuth84}\n");
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);

        let mut maker = LatexMaker::new(&config, "paper", &logger, ScriptedRunner::default());
        assert!(maker.need_bib_run(&auxfile::empty_counter("paper.aux")).unwrap());
    }

    #[test]
    fn test_missing_bib_is_skipped_with_warning() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        fs::write(dir.path().join("paper.aux"), "\\bibdata{refs}\n").unwrap();
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);

        let mut maker = LatexMaker::new(&config, "paper", &logger, ScriptedRunner::default());
        maker.out = "No file paper.bbl.\n".into();

        assert!(!maker.need_bib_run(&auxfile::empty_counter("paper.aux")).unwrap());
        assert!(logger.contains("Could not find *.bib file."));
    }

    #[test]
    fn test_full_run_with_bibliography() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        fs::write(dir.path().join("refs.bib"), "@book{knuth84,\n}\n@misc{unused,\n}\n").unwrap();
        let mut config = config_in(dir.path());
        config.behavior.check_cite = true;
        let logger = Logger::memory(Level::Info);
        let aux = "\\bibdata{refs}\n\\citation{knuth84}\n\\bibcite{knuth84}{1}\n";
        let runner = ScriptedRunner::new(vec![
            Pass {
                log: "No file paper.bbl.\n",
                aux,
                toc: None,
            },
            Pass {
                log: CLEAN_LOG,
                aux,
                toc: None,
            },
        ]);

        let mut maker = LatexMaker::new(&config, "paper", &logger, runner);
        maker.run().unwrap();

        assert_eq!(maker.runner.count("bibtex"), 1);
        assert_eq!(maker.latex_runs(), 2);
        assert_eq!(
            fs::read(dir.path().join("refs.bib.old")).unwrap(),
            fs::read(dir.path().join("refs.bib")).unwrap()
        );
        assert!(logger.contains("Bib entry not cited: \"unused\""));
        assert!(!logger.contains("\"knuth84\""));
    }

    // ------------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------------

    const ERROR_LOG: &str = "! Undefined control sequence.\nl.3 \\foo\n";

    #[test]
    fn test_log_errors_abort_with_exit_on_error() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);

        let mut maker = LatexMaker::new(&config, "paper", &logger, ScriptedRunner::new(vec![Pass::log(ERROR_LOG)]));
        let err = maker.run().unwrap_err();

        let LatexMkError::Compile(msg) = err else {
            panic!("expected compile error");
        };
        assert!(msg.contains("Undefined control sequence."));
        assert!(msg.contains("See \"paper.log\" for details."));
        assert_eq!(maker.latex_runs(), 1);
    }

    #[test]
    fn test_log_errors_reported_without_exit_on_error() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        let mut config = config_in(dir.path());
        config.behavior.exit_on_error = false;
        let logger = Logger::memory(Level::Info);

        let mut maker = LatexMaker::new(&config, "paper", &logger, ScriptedRunner::new(vec![Pass::log(ERROR_LOG)]));
        maker.run().unwrap();

        assert!(logger.contains("! Errors occurred:"));
        assert!(logger.contains("'paper.tex' compiled"));
    }

    #[test]
    fn test_missing_compiler_is_fatal() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);
        let mut runner = ScriptedRunner::new(vec![Pass::log(CLEAN_LOG)]);
        runner.missing = Some("pdflatex");

        let mut maker = LatexMaker::new(&config, "paper", &logger, runner);
        let err = maker.run().unwrap_err();

        assert!(matches!(err, LatexMkError::ToolNotFound(ref cmd) if cmd == "pdflatex"));
        assert_eq!(maker.latex_runs(), 0);
    }

    #[test]
    fn test_missing_bibtex_is_fatal() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        fs::write(dir.path().join("refs.bib"), "@book{knuth84,\n}\n").unwrap();
        let config = config_in(dir.path());
        let logger = Logger::memory(Level::Info);
        let mut runner = ScriptedRunner::new(vec![Pass {
            log: "No file paper.bbl.\n",
            aux: "\\bibdata{refs}\n",
            toc: None,
        }]);
        runner.missing = Some("bibtex");

        let mut maker = LatexMaker::new(&config, "paper", &logger, runner);
        let err = maker.run().unwrap_err();
        assert!(err.to_string().contains("\"bibtex\""));
    }

    // ------------------------------------------------------------------------
    // Clean / preview
    // ------------------------------------------------------------------------

    #[test]
    fn test_clean_keeps_sources_and_output() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        let mut config = config_in(dir.path());
        config.behavior.clean = true;
        let logger = Logger::memory(Level::Info);

        let mut maker = LatexMaker::new(&config, "paper", &logger, ScriptedRunner::new(vec![Pass::log(CLEAN_LOG)]));
        maker.run().unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, ["notes.txt", "paper.pdf", "paper.tex"]);
    }

    #[test]
    fn test_preview_uses_configured_viewer() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        let mut config = config_in(dir.path());
        config.behavior.preview = true;
        config.tools.viewer = Some("zathura".into());
        let logger = Logger::memory(Level::Info);

        let mut maker = LatexMaker::new(&config, "paper", &logger, ScriptedRunner::new(vec![Pass::log(CLEAN_LOG)]));
        maker.run().unwrap();

        assert_eq!(maker.runner.spawned, [["zathura", "paper.pdf"]]);
        assert_eq!(maker.runner.count("zathura"), 0);
    }

    #[test]
    fn test_preview_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        let mut config = config_in(dir.path());
        config.behavior.preview = true;
        config.tools.viewer = Some("zathura".into());
        let logger = Logger::memory(Level::Info);
        let mut runner = ScriptedRunner::new(vec![Pass::log(CLEAN_LOG)]);
        runner.missing = Some("zathura");

        let mut maker = LatexMaker::new(&config, "paper", &logger, runner);
        maker.run().unwrap();

        assert!(logger.contains("Preview-Error"));
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    #[test]
    fn test_success_is_notified() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        let mut config = config_in(dir.path());
        config.behavior.notify = true;
        let logger = Logger::memory_with_notifier(Level::Info);

        let mut maker = LatexMaker::new(&config, "paper", &logger, ScriptedRunner::new(vec![Pass::log(CLEAN_LOG)]));
        maker.run().unwrap();

        assert_eq!(logger.notifications(), [("'paper.tex' compiled".to_string(), None)]);
    }

    #[test]
    fn test_success_not_notified_when_disabled() {
        let dir = TempDir::new().unwrap();
        project(&dir);
        let config = config_in(dir.path());
        let logger = Logger::memory_with_notifier(Level::Info);

        let mut maker = LatexMaker::new(&config, "paper", &logger, ScriptedRunner::new(vec![Pass::log(CLEAN_LOG)]));
        maker.run().unwrap();

        assert!(logger.notifications().is_empty());
    }
}
