use clap::Parser;
use env_logger::Env;
use threatlens::cli::Args;
use threatlens::report::AnalysisReport;
use threatlens::{AnalysisOptions, ThreatAnalyzer};

fn print_summary(report: &AnalysisReport) {
    println!("Threat model: {} ({})", report.title, report.date);
    println!("  Technical assets: {}", report.counts.technical_assets);
    println!("  Data assets:      {}", report.counts.data_assets);
    println!("  Risks:            {}", report.statistics.total);
    println!("  Still at risk:    {}", report.statistics.still_at_risk);
    if let Some(severity) = report.highest_severity {
        println!("  Highest severity: {}", severity);
    }
    println!(
        "  Risk tracking:    {} matched, {} orphaned",
        report.reconciliation.matched, report.reconciliation.orphaned
    );
    if !report.failed_rules.is_empty() {
        println!("  Failed rules:     {}", report.failed_rules.join(", "));
    }

    for entry in report.risks.iter().filter(|r| r.status.is_still_at_risk()).take(10) {
        println!(
            "  [{}] {} ({})",
            entry.risk.severity, entry.risk.title, entry.risk.synthetic_id
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level()))
        .format_timestamp_millis()
        .init();

    log::info!("Threatlens starting with args: {:?}", args);

    let analyzer = ThreatAnalyzer::new(AnalysisOptions::from(&args));
    let outcome = analyzer.analyze_file(&args.model)?;
    let report = outcome.report();

    print_summary(&report);

    if let Some(path) = &args.output {
        report.write_to(path)?;
    }

    Ok(())
}
