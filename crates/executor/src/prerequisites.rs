use language::{LanguageRecipe, Registry};

/// Which toolchain programs of one recipe are missing from `PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainStatus {
    pub language: &'static str,
    pub missing: Vec<&'static str>,
}

impl ToolchainStatus {
    pub fn is_available(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn check_recipe(recipe: &LanguageRecipe) -> ToolchainStatus {
    let missing = recipe
        .toolchain()
        .into_iter()
        .filter(|program| which::which(program).is_err())
        .collect();
    ToolchainStatus {
        language: recipe.id,
        missing,
    }
}

/// Check every recipe in the registry, ordered by language id.
pub fn check_toolchains(registry: &Registry) -> Vec<ToolchainStatus> {
    registry.recipes().map(check_recipe).collect()
}
