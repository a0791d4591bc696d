use crate::config::Config;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

const RULE_WIDTH: usize = 50;

/// Result of provisioning one bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketOutcome {
    pub name: String,
    /// Bucket exists, either already or after creation
    pub ready: bool,
    /// Public-read policy was applied
    pub public: bool,
}

impl BucketOutcome {
    pub fn is_success(&self) -> bool {
        self.ready && self.public
    }
}

/// Per-bucket outcomes of one provisioning run, in processing order
#[derive(Debug, Clone, Default)]
pub struct ProvisionReport {
    outcomes: Vec<BucketOutcome>,
}

impl ProvisionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: BucketOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[BucketOutcome] {
        &self.outcomes
    }

    /// Buckets that were both present and made public
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.name.as_str())
    }

    pub fn is_complete(&self) -> bool {
        self.succeeded() == self.total()
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_complete() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    pub fn tally_line(&self) -> String {
        format!(
            "Setup complete: {}/{} buckets configured",
            self.succeeded(),
            self.total()
        )
    }

    /// Print the closing tally and next steps
    pub fn print_summary(&self, config: &Config) {
        println!("{}", rule());
        println!("{}", self.tally_line());
        println!("{}", rule());

        if self.is_complete() {
            println!("\n✓ All buckets are ready for public access!");
            if let Some(first) = self.outcomes.first() {
                println!("\nURLs will now work without authentication tokens:");
                println!("  {}/{}/path/to/file.pdf", config.endpoint(), first.name);
            }
        } else {
            println!("\n⚠ Some buckets failed to configure:");
            for name in self.failed() {
                println!("  - {}", name);
            }
        }
    }
}

pub(crate) fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, ready: bool, public: bool) -> BucketOutcome {
        BucketOutcome {
            name: name.to_string(),
            ready,
            public,
        }
    }

    #[test]
    fn test_all_succeeded() {
        let mut report = ProvisionReport::new();
        report.push(outcome("documents", true, true));
        report.push(outcome("templates", true, true));

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.tally_line(), "Setup complete: 2/2 buckets configured");
        assert_eq!(report.exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_partial_failure() {
        let mut report = ProvisionReport::new();
        report.push(outcome("documents", true, true));
        report.push(outcome("templates", false, false));
        report.push(outcome("attachments", true, false));

        assert_eq!(report.tally_line(), "Setup complete: 1/3 buckets configured");
        assert_eq!(report.failed().collect::<Vec<_>>(), vec!["templates", "attachments"]);
        assert_eq!(report.exit_code(), EXIT_FAILURE);
    }
}
