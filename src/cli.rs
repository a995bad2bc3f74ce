use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "threatlens",
    about = "Threatlens - architecture threat-model analysis and risk tracking",
    version
)]
pub struct Args {
    /// Threat model document to analyze (JSON)
    #[arg(short, long)]
    pub model: PathBuf,

    /// Risk rule category IDs to skip
    #[arg(long, value_delimiter = ',')]
    pub skip_rules: Vec<String>,

    /// Warn instead of failing when a tracking entry matches no risk
    #[arg(long)]
    pub ignore_orphaned_risk_tracking: bool,

    /// Evaluate risk rules in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Write the analysis report to a JSON file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging of all operations
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Log filter implied by the verbosity flags.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation() {
        let args = Args::parse_from(["threatlens", "-m", "model.json"]);
        assert_eq!(args.model, PathBuf::from("model.json"));
        assert!(args.skip_rules.is_empty());
        assert!(args.output.is_none());
        assert_eq!(args.log_level(), "info");
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let args = Args::parse_from(["threatlens", "-m", "m.json", "-v", "-q"]);
        assert_eq!(args.log_level(), "error");
    }

    #[test]
    fn test_model_is_required() {
        assert!(Args::try_parse_from(["threatlens"]).is_err());
    }
}
