#![allow(clippy::format_push_string)]

use crate::prediction::{PredictionReport, PredictionStatus};
use crate::report::{format_auc, ExperimentReport};

const RULE: &str = "═══════════════════════════════════════════════════════════════\n";
const THIN: &str = "───────────────────────────────────────────────────────────────\n";

pub struct ReportFormatter;

impl ReportFormatter {
    #[must_use]
    pub fn experiments(report: &ExperimentReport) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str(RULE);
        output.push_str("                  EXPERIMENT RESULTS                           \n");
        output.push_str(RULE);
        output.push('\n');

        if report.has_results() {
            output.push_str(&format!(
                "{:<18} {:>6} {:>9} {:>7} {:>8}  {}\n",
                "Model", "Window", "Accuracy", "F1", "ROC-AUC", "Params"
            ));
            output.push_str(THIN);
            for r in report.ranked() {
                output.push_str(&format!(
                    "{:<18} {:>6} {:>9.4} {:>7.4} {:>8}  {}\n",
                    r.model.as_str(),
                    r.window,
                    r.accuracy,
                    r.f1,
                    format_auc(r.roc_auc),
                    r.params
                ));
            }
            output.push('\n');
        }

        output.push_str(&format!("Trained:               {}\n", report.records.len()));
        output.push_str(&format!("Skipped:               {}\n", report.skipped.len()));
        output.push_str(&format!("Failed:                {}\n", report.failed.len()));
        output.push_str(&format!("Models saved:          {}\n", report.artifacts.len()));
        if !report.retired.is_empty() {
            output.push_str(&format!("Models retired:        {}\n", report.retired.len()));
        }
        output.push('\n');
        output.push_str(RULE);

        if !report.has_results() {
            output.push_str("\n⚠️  No experiment produced a result.\n");
            output.push_str("    The history may be too short or its labels single-class.\n\n");
        }

        output
    }

    #[must_use]
    pub fn predictions(report: &PredictionReport) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str(RULE);
        output.push_str("                  SAME-DAY PREDICTIONS                         \n");
        output.push_str(RULE);
        output.push('\n');

        let Some(date) = report.date else {
            output.push_str("Newest row is already labeled; nothing to predict.\n");
            output.push_str(RULE);
            return output;
        };

        output.push_str(&format!("Date:                  {date}\n"));
        output.push_str(&format!("Threshold:             {:.2}\n", report.threshold));
        output.push('\n');

        for outcome in &report.outcomes {
            let label = format!("[{:^17}] window={:>2}", outcome.model.as_str(), outcome.window);
            let line = match &outcome.status {
                PredictionStatus::Predicted {
                    rise_probability,
                    prediction,
                } => format!(
                    "{label}  rise probability={rise_probability:.4}  -> {}\n",
                    if *prediction == 1 { "RISE" } else { "FALL/FLAT" }
                ),
                PredictionStatus::MissingModel { path } => {
                    format!("{label}  no model ({})\n", path.display())
                }
                PredictionStatus::Skipped { reason } => format!("{label}  skipped: {reason}\n"),
                PredictionStatus::Failed { error } => format!("{label}  failed: {error}\n"),
            };
            output.push_str(&line);
        }

        output.push('\n');
        output.push_str(RULE);

        if !report.has_predictions() {
            output.push_str("\n⚠️  No usable prediction (missing models or insufficient data).\n\n");
        }

        output
    }
}
