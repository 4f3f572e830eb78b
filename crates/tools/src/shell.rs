//! Shell Tool
//!
//! Runs shell commands under a conservative validator: no command
//! substitution, no redirection, and every pipeline segment must start with
//! an allowlisted program. Output is truncated so a chatty command cannot
//! flood the conversation.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use agent_gateway_core::CoreResult;

use crate::tool::{Tool, ToolOutcome};

const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const MAX_OUTPUT_CHARS: usize = 16_000;

const DEFAULT_ALLOWED: &[&str] = &[
    "ls", "cat", "head", "tail", "wc", "grep", "find", "echo", "pwd", "date", "whoami", "uname",
    "df", "du", "sort", "uniq", "cut", "tr", "basename", "dirname", "stat", "file",
];

const UNSUPPORTED: &[&str] = &["source", ".", "eval", "exec", "coproc", "fg", "bg", "jobs"];

/// Validates a shell command against an allowlist before execution.
pub struct ShellCommandValidator {
    allowed: HashSet<String>,
}

impl ShellCommandValidator {
    pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: allowed.into_iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Returns `None` when the command is acceptable, otherwise the reason
    /// it was rejected.
    pub fn validate(&self, raw: &str) -> Option<String> {
        let script = raw.trim();
        if script.is_empty() {
            return Some("Cannot parse command: empty".to_string());
        }

        if let Some(reason) = unsupported_syntax(script) {
            return Some(reason);
        }

        // Split on pipeline/sequence connectors outside quotes; each
        // segment's first token must be an allowed program.
        for segment in split_segments(script) {
            let first = match segment.split_whitespace().next() {
                Some(token) => token,
                None => return Some("Cannot parse command: empty segment".to_string()),
            };
            let program = first.rsplit('/').next().unwrap_or(first).to_lowercase();
            if UNSUPPORTED.contains(&program.as_str()) {
                return Some(format!("Unsupported command: {}", program));
            }
            if !self.allowed.contains(&program) {
                return Some(format!("Command not allowed: {}", program));
            }
        }

        None
    }
}

impl Default for ShellCommandValidator {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED.iter().map(|s| s.to_string()))
    }
}

fn unsupported_syntax(script: &str) -> Option<String> {
    let mut single_quoted = false;
    let mut double_quoted = false;
    let mut escaped = false;
    let chars: Vec<char> = script.chars().collect();

    for i in 0..chars.len() {
        let ch = chars[i];
        if escaped {
            escaped = false;
            continue;
        }
        if single_quoted {
            if ch == '\'' {
                single_quoted = false;
            }
            continue;
        }
        if double_quoted {
            match ch {
                '"' => double_quoted = false,
                '\\' => escaped = true,
                '`' => return Some("Unsupported syntax: backtick command substitution".to_string()),
                '$' if chars.get(i + 1) == Some(&'(') => {
                    return Some("Unsupported syntax: command substitution".to_string())
                }
                _ => {}
            }
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '\'' => single_quoted = true,
            '"' => double_quoted = true,
            '`' => return Some("Unsupported syntax: backtick command substitution".to_string()),
            '$' if chars.get(i + 1) == Some(&'(') => {
                return Some("Unsupported syntax: command substitution".to_string())
            }
            '<' | '>' => return Some("Unsupported syntax: redirection".to_string()),
            _ => {}
        }
    }

    if single_quoted || double_quoted {
        return Some("Cannot parse command: unterminated quote".to_string());
    }
    None
}

/// Split a command line into segments at `|`, `&&`, `||`, and `;`
/// connectors occurring outside quotes.
fn split_segments(script: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut single_quoted = false;
    let mut double_quoted = false;
    let mut chars = script.chars().peekable();

    while let Some(ch) = chars.next() {
        if single_quoted {
            if ch == '\'' {
                single_quoted = false;
            }
            current.push(ch);
            continue;
        }
        if double_quoted {
            if ch == '"' {
                double_quoted = false;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '\'' => {
                single_quoted = true;
                current.push(ch);
            }
            '"' => {
                double_quoted = true;
                current.push(ch);
            }
            '|' | '&' | ';' => {
                // Collapse doubled connectors (&&, ||).
                if (ch == '|' || ch == '&') && chars.peek() == Some(&ch) {
                    chars.next();
                }
                if !current.trim().is_empty() {
                    segments.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        segments.push(current.trim().to_string());
    }
    segments
}

/// Shell command tool.
pub struct ShellTool {
    validator: ShellCommandValidator,
    timeout: Duration,
}

impl ShellTool {
    pub fn new(validator: ShellCommandValidator, timeout: Duration) -> Self {
        Self { validator, timeout }
    }
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new(
            ShellCommandValidator::default(),
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
        )
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Run a read-only shell command. Pipelines are allowed; redirection and command substitution are not."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to run",
                }
            },
            "required": ["command"],
        })
    }

    async fn execute(&self, args: &Value) -> CoreResult<ToolOutcome> {
        let command = match args.get("command").and_then(Value::as_str) {
            Some(c) if !c.trim().is_empty() => c.to_string(),
            _ => return Ok(ToolOutcome::err("Missing required argument: command")),
        };

        if let Some(reason) = self.validator.validate(&command) {
            return Ok(ToolOutcome::err(reason));
        }

        debug!(command = %command, "running shell command");
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&command);
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Ok(ToolOutcome::err(format!("Failed to spawn: {}", e))),
            Err(_) => {
                return Ok(ToolOutcome::err(format!(
                    "Command timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(stderr.trim_end());
        }
        if text.chars().count() > MAX_OUTPUT_CHARS {
            text = text.chars().take(MAX_OUTPUT_CHARS).collect::<String>() + "\n... (truncated)";
        }

        if output.status.success() {
            Ok(ToolOutcome::ok(text))
        } else {
            Ok(ToolOutcome::err(format!(
                "exit status {}: {}",
                output.status.code().unwrap_or(-1),
                text
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_allows_simple_command() {
        let validator = ShellCommandValidator::default();
        assert!(validator.validate("ls -la").is_none());
        assert!(validator.validate("echo hello world").is_none());
    }

    #[test]
    fn test_validator_allows_pipelines() {
        let validator = ShellCommandValidator::default();
        assert!(validator.validate("ls | grep foo | wc -l").is_none());
        assert!(validator.validate("cat a.txt && echo done").is_none());
    }

    #[test]
    fn test_validator_rejects_disallowed_program() {
        let validator = ShellCommandValidator::default();
        let reason = validator.validate("rm -rf /").unwrap();
        assert!(reason.contains("not allowed"));
        // Rejection applies per pipeline segment too.
        assert!(validator.validate("ls | rm -rf /tmp/x").is_some());
    }

    #[test]
    fn test_validator_rejects_substitution_and_redirection() {
        let validator = ShellCommandValidator::default();
        assert!(validator.validate("echo `whoami`").is_some());
        assert!(validator.validate("echo $(whoami)").is_some());
        assert!(validator.validate("echo hi > /tmp/out").is_some());
    }

    #[test]
    fn test_validator_ignores_metacharacters_in_quotes() {
        let validator = ShellCommandValidator::default();
        assert!(validator.validate("echo 'a | b > c'").is_none());
        assert!(validator.validate("grep \"x;y\" file.txt").is_none());
    }

    #[test]
    fn test_validator_rejects_unsupported_builtins() {
        let validator = ShellCommandValidator::default();
        assert!(validator.validate("eval ls").is_some());
        assert!(validator.validate("source env.sh").is_some());
    }

    #[test]
    fn test_validator_rejects_unterminated_quote() {
        let validator = ShellCommandValidator::default();
        assert!(validator.validate("echo 'oops").is_some());
    }

    #[test]
    fn test_split_segments() {
        assert_eq!(
            split_segments("ls | grep x && echo done"),
            vec!["ls", "grep x", "echo done"]
        );
        assert_eq!(split_segments("echo 'a|b'"), vec!["echo 'a|b'"]);
    }

    #[tokio::test]
    async fn test_shell_tool_runs_command() {
        let tool = ShellTool::default();
        let outcome = tool
            .execute(&serde_json::json!({"command": "echo hello"}))
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.output.as_deref().map(str::trim), Some("hello"));
    }

    #[tokio::test]
    async fn test_shell_tool_rejects_invalid() {
        let tool = ShellTool::default();
        let outcome = tool
            .execute(&serde_json::json!({"command": "curl http://example.com"}))
            .await
            .unwrap();
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_shell_tool_missing_argument() {
        let tool = ShellTool::default();
        let outcome = tool.execute(&serde_json::json!({})).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("command"));
    }
}
