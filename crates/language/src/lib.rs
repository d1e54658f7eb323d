mod builtin;
mod error;
mod recipe;
mod registry;
mod transform;

pub use builtin::BUILTIN_RECIPES;
pub use error::{LanguageError, Result};
pub use recipe::{CommandLine, CommandTemplate, LanguageRecipe, Substitutions};
pub use registry::Registry;
pub use transform::SourceTransform;
