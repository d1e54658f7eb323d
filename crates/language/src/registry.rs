//! Lookup of recipes by id or alias.

use std::collections::{BTreeMap, HashMap};

use crate::builtin::BUILTIN_RECIPES;
use crate::error::{LanguageError, Result};
use crate::recipe::LanguageRecipe;

/// Read-only map from language identifier to recipe.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it
/// afterwards, so concurrent lookups need no lock.
#[derive(Debug, Clone)]
pub struct Registry {
    recipes: BTreeMap<&'static str, LanguageRecipe>,
    aliases: HashMap<&'static str, &'static str>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    pub fn builtin() -> Self {
        Self::from_recipes(BUILTIN_RECIPES.iter().copied())
    }

    /// Later recipes replace earlier ones with the same id.
    pub fn from_recipes(recipes: impl IntoIterator<Item = LanguageRecipe>) -> Self {
        let mut by_id = BTreeMap::new();
        let mut aliases = HashMap::new();
        for recipe in recipes {
            for alias in recipe.aliases {
                aliases.insert(*alias, recipe.id);
            }
            by_id.insert(recipe.id, recipe);
        }
        Self {
            recipes: by_id,
            aliases,
        }
    }

    /// Resolve a language identifier. Canonical ids win over aliases.
    pub fn lookup(&self, language_id: &str) -> Result<&LanguageRecipe> {
        self.recipes
            .get(language_id)
            .or_else(|| {
                self.aliases
                    .get(language_id)
                    .and_then(|id| self.recipes.get(id))
            })
            .ok_or_else(|| LanguageError::Unsupported(language_id.to_string()))
    }

    /// Recipes ordered by id.
    pub fn recipes(&self) -> impl Iterator<Item = &LanguageRecipe> {
        self.recipes.values()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::CommandTemplate;
    use crate::transform::SourceTransform;

    const SUPPORTED: [&str; 7] = [
        "python",
        "javascript",
        "typescript",
        "go",
        "cpp",
        "rust",
        "java",
    ];

    #[test]
    fn every_builtin_language_resolves_with_a_run_command() {
        let registry = Registry::builtin();
        assert_eq!(registry.len(), SUPPORTED.len());
        for id in SUPPORTED {
            let recipe = registry.lookup(id).unwrap();
            assert_eq!(recipe.id, id);
            assert!(!recipe.run.program.is_empty(), "{id} has empty run program");
            assert_eq!(recipe.artifacts.first(), Some(&"{source}"), "{id}");
        }
    }

    #[test]
    fn compiled_languages_declare_their_binary() {
        let registry = Registry::builtin();
        for id in ["cpp", "rust", "java"] {
            let recipe = registry.lookup(id).unwrap();
            assert!(recipe.is_compiled(), "{id}");
            assert_eq!(recipe.artifacts.len(), 2, "{id}");
        }
        for id in ["python", "javascript", "typescript", "go"] {
            assert!(!registry.lookup(id).unwrap().is_compiled(), "{id}");
        }
    }

    #[test]
    fn java_uses_the_identifier_for_file_class_and_run() {
        let java = *Registry::builtin().lookup("java").unwrap();
        assert_eq!(java.transform, SourceTransform::RenameMainClass);
        assert!(java.run.args.contains(&"{id}"));
        assert!(java.artifacts.contains(&"{id}.class"));
    }

    #[test]
    fn aliases_resolve_to_canonical_recipe() {
        let registry = Registry::builtin();
        assert_eq!(registry.lookup("js").unwrap().id, "javascript");
        assert_eq!(registry.lookup("c++").unwrap().id, "cpp");
        assert_eq!(registry.lookup("golang").unwrap().id, "go");
    }

    #[test]
    fn unknown_language_is_unsupported() {
        let err = Registry::builtin().lookup("brainfuck").unwrap_err();
        assert!(matches!(err, LanguageError::Unsupported(ref id) if id == "brainfuck"));
        assert_eq!(err.to_string(), "unsupported language: brainfuck");
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(Registry::builtin().lookup("Python").is_err());
    }

    #[test]
    fn recipes_iterate_in_id_order() {
        let ids: Vec<_> = Registry::builtin().recipes().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn from_recipes_later_entry_wins() {
        let first = LanguageRecipe {
            id: "shell",
            name: "Shell",
            aliases: &["sh"],
            extension: "sh",
            build: None,
            run: CommandTemplate::new("sh", &["{source}"]),
            artifacts: &["{source}"],
            transform: SourceTransform::None,
        };
        let second = LanguageRecipe {
            run: CommandTemplate::new("bash", &["{source}"]),
            ..first
        };
        let registry = Registry::from_recipes([first, second]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("sh").unwrap().run.program, "bash");
    }

    #[test]
    fn empty_registry() {
        let registry = Registry::from_recipes([]);
        assert!(registry.is_empty());
        assert!(registry.lookup("python").is_err());
    }
}
