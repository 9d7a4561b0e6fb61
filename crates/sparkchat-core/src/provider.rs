#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Canned,
    Ollama,
}

impl GeneratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::Canned => "canned",
            GeneratorKind::Ollama => "ollama",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "canned" | "mock" => Some(GeneratorKind::Canned),
            "ollama" => Some(GeneratorKind::Ollama),
            _ => None,
        }
    }

    pub fn all() -> Vec<GeneratorKind> {
        vec![GeneratorKind::Canned, GeneratorKind::Ollama]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GeneratorKind::Canned => "Canned responses (offline)",
            GeneratorKind::Ollama => "Ollama (Local)",
        }
    }
}
