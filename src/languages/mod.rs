//! Language registry: execution-service ids, display metadata and starter templates.

use std::path::Path;

/// Static metadata describing one supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageDescriptor {
    pub key: &'static str,
    /// Identifier understood by the execution service.
    pub execution_id: u32,
    pub display_name: &'static str,
    pub label: &'static str,
    pub editor_syntax_id: &'static str,
    pub extension: &'static str,
    pub starter_template: &'static str,
}

pub const DEFAULT_LANGUAGE: &str = "python";

const LANGUAGES: &[LanguageDescriptor] = &[
    LanguageDescriptor {
        key: "c",
        execution_id: 50,
        display_name: "C (GCC 9.2.0)",
        label: "C",
        editor_syntax_id: "c",
        extension: ".c",
        starter_template: "#include <stdio.h>\n\nint main() {\n    printf(\"Hello, World!\\n\");\n    return 0;\n}",
    },
    LanguageDescriptor {
        key: "cpp",
        execution_id: 54,
        display_name: "C++ (GCC 9.2.0)",
        label: "C++",
        editor_syntax_id: "cpp",
        extension: ".cpp",
        starter_template: "#include <iostream>\nusing namespace std;\n\nint main() {\n    cout << \"Hello, World!\" << endl;\n    return 0;\n}",
    },
    LanguageDescriptor {
        key: "python",
        execution_id: 71,
        display_name: "Python (3.8.1)",
        label: "Python",
        editor_syntax_id: "python",
        extension: ".py",
        starter_template: "def main():\n    print(\"Hello, World!\")\n\nif __name__ == \"__main__\":\n    main()",
    },
    LanguageDescriptor {
        key: "java",
        execution_id: 62,
        display_name: "Java (OpenJDK 13.0.1)",
        label: "Java",
        editor_syntax_id: "java",
        extension: ".java",
        starter_template: "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, World!\");\n    }\n}",
    },
    LanguageDescriptor {
        key: "javascript",
        execution_id: 63,
        display_name: "JavaScript (Node.js 12.14.0)",
        label: "JavaScript",
        editor_syntax_id: "javascript",
        extension: ".js",
        starter_template: "function main() {\n    console.log(\"Hello, World!\");\n}\n\nmain();",
    },
    LanguageDescriptor {
        key: "go",
        execution_id: 60,
        display_name: "Go (1.13.5)",
        label: "Go",
        editor_syntax_id: "go",
        extension: ".go",
        starter_template: "package main\n\nimport \"fmt\"\n\nfunc main() {\n    fmt.Println(\"Hello, World!\")\n}",
    },
    LanguageDescriptor {
        key: "rust",
        execution_id: 73,
        display_name: "Rust (1.40.0)",
        label: "Rust",
        editor_syntax_id: "rust",
        extension: ".rs",
        starter_template: "fn main() {\n    println!(\"Hello, World!\");\n}",
    },
    LanguageDescriptor {
        key: "php",
        execution_id: 68,
        display_name: "PHP (7.4.1)",
        label: "PHP",
        editor_syntax_id: "php",
        extension: ".php",
        starter_template: "<?php\necho \"Hello, World!\\n\";\n?>",
    },
];

/// Immutable set of descriptors, in registration order.
#[derive(Debug, Clone, Copy)]
pub struct Registry {
    languages: &'static [LanguageDescriptor],
    default_index: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    pub fn builtin() -> Self {
        let default_index = LANGUAGES
            .iter()
            .position(|l| l.key == DEFAULT_LANGUAGE)
            .unwrap_or(0);
        Self { languages: LANGUAGES, default_index }
    }

    pub fn default_descriptor(&self) -> &'static LanguageDescriptor {
        &self.languages[self.default_index]
    }

    /// Total lookup: unknown keys resolve to the default descriptor.
    pub fn describe(&self, key: &str) -> &'static LanguageDescriptor {
        self.find(key).unwrap_or_else(|| self.default_descriptor())
    }

    /// Strict lookup for callers that must reject unknown keys.
    pub fn find(&self, key: &str) -> Option<&'static LanguageDescriptor> {
        self.languages.iter().find(|l| l.key == key)
    }

    pub fn list_all(&self) -> &'static [LanguageDescriptor] {
        self.languages
    }

    pub fn template(&self, key: &str) -> &'static str {
        self.describe(key).starter_template
    }

    /// Infer a language from a source file name (`main.py` -> python).
    pub fn from_path(&self, path: &Path) -> Option<&'static LanguageDescriptor> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.languages
            .iter()
            .find(|l| l.extension.trim_start_matches('.') == ext)
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.languages.iter().map(|l| l.key).collect()
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.languages.iter().position(|l| l.key == key)
    }
}
