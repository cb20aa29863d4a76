//! Secret redaction for display text.
//!
//! Applied to anything destined for logs or the published report, never to
//! the raw output the classifier sees. Masks every occurrence of the known
//! secrets, and additionally any token that appears in `--auth-token=…`
//! form inside the text itself (commands echoed into error output carry the
//! token even when the caller forgot to register it).

use std::sync::OnceLock;

use regex::Regex;

const MASK: &str = "***";

fn auth_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"--auth-token=(\S+)").expect("auth token pattern is valid")
    })
}

/// Masks known secrets in display text.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    secrets: Vec<String>,
}

impl Redactor {
    /// A redactor for the given secrets. Empty secrets are ignored; they
    /// would otherwise mask everything.
    pub fn new<I>(secrets: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            secrets: secrets.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    /// Return `input` with every secret occurrence replaced by `***`.
    pub fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        for secret in &self.secrets {
            output = output.replace(secret.as_str(), MASK);
        }
        // Tokens leaked through echoed command lines.
        let embedded: Vec<String> = auth_token_pattern()
            .captures_iter(&output)
            .map(|caps| caps[1].to_string())
            .filter(|token| token != MASK)
            .collect();
        for token in embedded {
            output = output.replace(token.as_str(), MASK);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_secret_is_masked_everywhere() {
        let redactor = Redactor::new(vec!["s3cr3t".to_string()]);
        let output = redactor.redact("token s3cr3t appears twice: s3cr3t");
        assert!(!output.contains("s3cr3t"));
        assert_eq!(output, "token *** appears twice: ***");
    }

    #[test]
    fn embedded_auth_token_flag_is_masked() {
        let redactor = Redactor::new(Vec::new());
        let output =
            redactor.redact("ran: argocd app diff x --auth-token=abc.def-123 --server=s\nabc.def-123 again");
        assert!(!output.contains("abc.def-123"));
        assert!(output.contains("--auth-token=***"));
    }

    #[test]
    fn empty_secret_does_not_destroy_text() {
        let redactor = Redactor::new(vec![String::new()]);
        assert_eq!(redactor.redact("untouched"), "untouched");
    }

    #[test]
    fn text_without_secrets_passes_through() {
        let redactor = Redactor::new(vec!["tok".to_string()]);
        assert_eq!(redactor.redact("nothing to hide"), "nothing to hide");
    }
}
