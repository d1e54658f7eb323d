use crate::recipe::{CommandTemplate, LanguageRecipe};
use crate::transform::SourceTransform;

/// Recipes served by [`Registry::builtin`](crate::Registry::builtin).
pub const BUILTIN_RECIPES: &[LanguageRecipe] = &[
    LanguageRecipe {
        id: "python",
        name: "Python",
        aliases: &["py", "python3"],
        extension: "py",
        build: None,
        run: CommandTemplate::new("python3", &["{source}"]),
        artifacts: &["{source}"],
        transform: SourceTransform::None,
    },
    LanguageRecipe {
        id: "javascript",
        name: "JavaScript",
        aliases: &["js", "node"],
        extension: "js",
        build: None,
        run: CommandTemplate::new("node", &["{source}"]),
        artifacts: &["{source}"],
        transform: SourceTransform::None,
    },
    LanguageRecipe {
        id: "typescript",
        name: "TypeScript",
        aliases: &["ts"],
        extension: "ts",
        build: None,
        run: CommandTemplate::new("ts-node", &["{source}"]),
        artifacts: &["{source}"],
        transform: SourceTransform::None,
    },
    LanguageRecipe {
        id: "go",
        name: "Go",
        aliases: &["golang"],
        extension: "go",
        build: None,
        run: CommandTemplate::new("go", &["run", "{source}"]),
        artifacts: &["{source}"],
        transform: SourceTransform::None,
    },
    LanguageRecipe {
        id: "cpp",
        name: "C++",
        aliases: &["c++", "cxx"],
        extension: "cpp",
        build: Some(CommandTemplate::new("g++", &["{source}", "-o", "{id}"])),
        run: CommandTemplate::new("{dir}/{id}", &[]),
        artifacts: &["{source}", "{id}"],
        transform: SourceTransform::None,
    },
    LanguageRecipe {
        id: "rust",
        name: "Rust",
        aliases: &["rs"],
        extension: "rs",
        build: Some(CommandTemplate::new("rustc", &["{source}", "-o", "{id}"])),
        run: CommandTemplate::new("{dir}/{id}", &[]),
        artifacts: &["{source}", "{id}"],
        transform: SourceTransform::None,
    },
    LanguageRecipe {
        id: "java",
        name: "Java",
        aliases: &[],
        extension: "java",
        build: Some(CommandTemplate::new("javac", &["{source}"])),
        run: CommandTemplate::new("java", &["-cp", ".", "{id}"]),
        artifacts: &["{source}", "{id}.class"],
        transform: SourceTransform::RenameMainClass,
    },
];
