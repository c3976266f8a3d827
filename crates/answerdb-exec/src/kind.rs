use std::fmt;
use std::path::Path;

/// Script types the dispatcher knows how to run. Adding a language means
/// adding a variant here; nothing else matches on extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    Python,
    Shell,
}

impl ScriptKind {
    pub const ALL: [ScriptKind; 2] = [ScriptKind::Python, ScriptKind::Shell];

    pub fn extension(self) -> &'static str {
        match self {
            ScriptKind::Python => "py",
            ScriptKind::Shell => "sh",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.extension() == ext)
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(Self::from_extension)
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptKind::Python => f.write_str("python"),
            ScriptKind::Shell => f.write_str("shell"),
        }
    }
}

/// Interpreter binary per script kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreters {
    pub python: String,
    pub shell: String,
}

impl Default for Interpreters {
    fn default() -> Self {
        Self { python: "python3".to_string(), shell: "bash".to_string() }
    }
}

impl Interpreters {
    pub fn command_for(&self, kind: ScriptKind) -> &str {
        match kind {
            ScriptKind::Python => &self.python,
            ScriptKind::Shell => &self.shell,
        }
    }
}
