use std::path::PathBuf;

/// Problems found while reading a layout document.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid KDL: {0}")]
    Syntax(String),

    #[error("Session name must not be empty")]
    EmptyName,

    #[error("Session name '{0}' must not contain '.' or ':'")]
    InvalidName(String),

    #[error("No root path given and no default root available")]
    MissingRoot,

    #[error("Duplicate '{0}' node")]
    DuplicateNode(String),

    #[error("Unexpected node '{node}' in {context}")]
    UnexpectedNode { node: String, context: String },

    #[error("Unexpected property '{property}' on {context}")]
    UnexpectedProperty { property: String, context: String },

    #[error("'{0}' expects a single string argument")]
    ExpectedString(String),

    #[error("Window {0}: name is required")]
    MissingWindowName(usize),

    #[error("Window '{0}' has no panes")]
    EmptyWindow(String),

    #[error("Window '{window}': invalid split '{value}' (expected none, horizontal or vertical)")]
    InvalidSplit { window: String, value: String },

    #[error("Window '{window}': invalid size '{value}' (expected lines or a percentage)")]
    InvalidSize { window: String, value: String },

    #[error("Window '{window}': 'focus' must be true or false")]
    InvalidFocus { window: String },

    #[error("Window '{window}': command is empty")]
    EmptyCommand { window: String },

    #[error("Window '{window}': cannot split shell line: {message}")]
    ShellSyntax { window: String, message: String },

    #[error(
        "Window '{window}': shell line uses '{found}', which needs a real shell; \
         quote it, or use run \"sh\" \"-c\" \"...\""
    )]
    ShellFeature { window: String, found: String },
}

/// Invariant violations caught while turning a layout into directives.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Session name must not be empty")]
    EmptyName,

    #[error("Session name '{0}' must not contain '.' or ':'")]
    InvalidName(String),

    #[error("Root path must be absolute: {}", .0.display())]
    RelativeRoot(PathBuf),

    #[error("Window name must not be empty")]
    EmptyWindowName,

    #[error("Window '{0}' has no panes")]
    EmptyWindow(String),

    #[error("Duplicate window name: {0}")]
    DuplicateWindow(String),

    #[error("Window '{0}' has more than one unsplit pane")]
    MultipleBasePanes(String),

    #[error("Window '{0}' focuses more than one pane")]
    MultipleFocus(String),

    #[error("Window '{window}': pane {pane} has a size but no split direction")]
    SizeWithoutSplit { window: String, pane: usize },

    #[error("Window '{window}': pane {pane} has an invalid size")]
    InvalidSize { window: String, pane: usize },

    #[error("Window '{window}': pane {pane} has an empty command")]
    EmptyCommand { window: String, pane: usize },
}

/// Failures reported by a multiplexer backend.
#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from `{command}`: {output:?}")]
    UnexpectedOutput { command: String, output: String },

    #[error("no session has been established")]
    NoSession,

    #[error("no window has been created yet")]
    NoWindow,

    #[error("unknown target: {0}")]
    UnknownTarget(String),
}

/// A directive that failed while being applied, with its position in the plan.
#[derive(Debug, thiserror::Error)]
#[error("directive {index} ({directive}) failed: {source}")]
pub struct ExecutionError {
    pub index: usize,
    pub directive: String,
    #[source]
    pub source: MuxError,
}

#[derive(Debug, thiserror::Error)]
pub enum TrellisError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Layout not found: {0}")]
    LayoutNotFound(String),

    #[error("Layout already exists: {}", .0.display())]
    LayoutExists(PathBuf),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

pub type TrellisResult<T> = Result<T, TrellisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParseError::EmptyName;
        assert_eq!(err.to_string(), "Session name must not be empty");

        let err = ParseError::EmptyWindow("idx".to_string());
        assert_eq!(err.to_string(), "Window 'idx' has no panes");

        let err = PlanError::DuplicateWindow("logs".to_string());
        assert_eq!(err.to_string(), "Duplicate window name: logs");

        let err = TrellisError::LayoutNotFound("web".to_string());
        assert_eq!(err.to_string(), "Layout not found: web");
    }

    #[test]
    fn test_execution_error_carries_index() {
        let err = ExecutionError {
            index: 3,
            directive: "split-pane vertical 15 (pane 0)".to_string(),
            source: MuxError::Failed {
                command: "tmux split-window".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "no space for new pane".to_string(),
            },
        };
        let message = TrellisError::from(err).to_string();
        assert!(message.contains("directive 3"));
        assert!(message.contains("no space for new pane"));
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("test error");
        let err = TrellisError::Store(anyhow_err);
        assert!(err.to_string().contains("test error"));
    }
}
