use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::transform::SourceTransform;

/// A program and its argument list, each a template over `{id}`, `{source}`
/// and `{dir}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

impl CommandTemplate {
    pub const fn new(program: &'static str, args: &'static [&'static str]) -> Self {
        Self { program, args }
    }

    pub fn render(&self, vars: &Substitutions<'_>) -> CommandLine {
        CommandLine {
            program: vars.apply(self.program),
            args: self.args.iter().map(|arg| vars.apply(arg)).collect(),
        }
    }

    /// The program name if it is looked up on `PATH` rather than produced
    /// inside the workspace (e.g. `{dir}/{id}`).
    pub fn fixed_program(&self) -> Option<&'static str> {
        (!self.program.contains('{')).then_some(self.program)
    }
}

/// Per-request values substituted into every template of a recipe.
#[derive(Debug, Clone, Copy)]
pub struct Substitutions<'a> {
    pub id: &'a str,
    pub source: &'a str,
    pub dir: &'a Path,
}

impl Substitutions<'_> {
    pub fn apply(&self, template: &str) -> String {
        // `{dir}` last: a workspace path never gets re-expanded.
        template
            .replace("{id}", self.id)
            .replace("{source}", self.source)
            .replace("{dir}", &self.dir.display().to_string())
    }
}

/// A fully rendered command, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How to build and run source code of one language.
///
/// Recipes are plain `'static` data so the builtin table is a `const` and a
/// registry can be shared across threads without locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageRecipe {
    /// Canonical identifier sent by clients (`"python"`, `"cpp"`, ...).
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Alternative identifiers that resolve to this recipe.
    pub aliases: &'static [&'static str],
    /// Source file extension, without the dot.
    pub extension: &'static str,
    /// Optional compile step; a non-zero exit aborts before `run`.
    pub build: Option<CommandTemplate>,
    pub run: CommandTemplate,
    /// Every file the recipe can leave behind, source file first.
    pub artifacts: &'static [&'static str],
    pub transform: SourceTransform,
}

impl LanguageRecipe {
    pub fn source_file_name(&self, id: &str) -> String {
        format!("{id}.{}", self.extension)
    }

    pub fn is_compiled(&self) -> bool {
        self.build.is_some()
    }

    pub fn build_command(&self, vars: &Substitutions<'_>) -> Option<CommandLine> {
        self.build.map(|build| build.render(vars))
    }

    pub fn run_command(&self, vars: &Substitutions<'_>) -> CommandLine {
        self.run.render(vars)
    }

    /// Absolute paths of every declared artifact, known before anything runs.
    pub fn artifact_paths(&self, vars: &Substitutions<'_>) -> Vec<PathBuf> {
        self.artifacts
            .iter()
            .map(|template| vars.dir.join(vars.apply(template)))
            .collect()
    }

    /// Source text as it must be written to disk for this request.
    pub fn prepare_source<'a>(&self, code: &'a str, id: &str) -> Cow<'a, str> {
        self.transform.apply(code, id)
    }

    /// Programs that must be on `PATH` for this recipe to work.
    pub fn toolchain(&self) -> Vec<&'static str> {
        let mut programs = Vec::with_capacity(2);
        for template in self.build.iter().chain(std::iter::once(&self.run)) {
            if let Some(program) = template.fixed_program()
                && !programs.contains(&program)
            {
                programs.push(program);
            }
        }
        programs
    }
}
