//! セットアップの進捗表示
//!
//! 各ステップの開始・結果・所要時間をタイムスタンプ付きで出力し、
//! 最後にサマリーを表示する。

use chrono::Local;
use colored::Colorize;
use firestrap_core::{BootstrapError, ProgressSink, StepKind, StepOutcome};
use std::time::{Duration, Instant};

/// ステップの実行結果
#[derive(Debug, Clone)]
enum StepResult {
    Finished {
        outcome: StepOutcome,
        duration: Duration,
    },
    Failed {
        error: String,
        duration: Duration,
    },
}

impl StepResult {
    fn duration(&self) -> Duration {
        match self {
            Self::Finished { duration, .. } | Self::Failed { duration, .. } => *duration,
        }
    }
}

/// セットアップログ出力器
pub struct SetupLogger {
    start_time: Instant,
    step_results: Vec<(StepKind, StepResult)>,
    current_step: Option<(StepKind, Instant)>,
}

impl SetupLogger {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            step_results: Vec::new(),
            current_step: None,
        }
    }

    fn timestamp() -> String {
        Local::now().format("%H:%M:%S").to_string()
    }

    fn count(&self, pred: impl Fn(&StepResult) -> bool) -> usize {
        self.step_results.iter().filter(|(_, r)| pred(r)).count()
    }

    /// サマリーを出力
    pub fn print_summary(&self, project_id: &str) {
        let total_duration = self.start_time.elapsed();

        let changed = self.count(|r| {
            matches!(
                r,
                StepResult::Finished {
                    outcome: StepOutcome::Completed { .. },
                    ..
                }
            )
        });
        let skipped = self.count(|r| {
            matches!(
                r,
                StepResult::Finished {
                    outcome: StepOutcome::Skipped { .. },
                    ..
                }
            )
        });
        let tolerated = self.count(|r| {
            matches!(
                r,
                StepResult::Finished {
                    outcome: StepOutcome::Tolerated { .. },
                    ..
                }
            )
        });
        let error_count = self.count(|r| matches!(r, StepResult::Failed { .. }));

        let slowest_step = self
            .step_results
            .iter()
            .map(|(step, result)| (step, result.duration()))
            .max_by_key(|(_, d)| *d);

        println!();
        println!("{}", "═".repeat(44));
        println!("Setup Summary: {}", project_id.cyan().bold());
        println!("{}", "─".repeat(44));
        println!("Total time:    {}", format_duration(total_duration).green());

        if let Some((step, duration)) = slowest_step {
            println!(
                "Slowest step:  {} ({})",
                step.label(),
                format_duration(duration)
            );
        }

        println!("Changed:       {}", changed);
        println!("Skipped:       {}", skipped);
        if tolerated > 0 {
            println!("Tolerated:     {}", tolerated.to_string().yellow());
        } else {
            println!("Tolerated:     0");
        }

        if error_count > 0 {
            println!("Errors:        {}", error_count.to_string().red().bold());
            for (step, result) in &self.step_results {
                if let StepResult::Failed { error, .. } = result {
                    println!("  {} {}: {}", "✗".red(), step.label(), first_line(error));
                }
            }
        } else {
            println!("Errors:        {}", "0".green());
        }
        println!("{}", "═".repeat(44));
    }
}

impl Default for SetupLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for SetupLogger {
    fn step_started(&mut self, step: StepKind) {
        println!(
            "[{}] {} {}",
            Self::timestamp().dimmed(),
            "▶".cyan(),
            step.label()
        );
        self.current_step = Some((step, Instant::now()));
    }

    fn step_finished(&mut self, step: StepKind, outcome: &StepOutcome, duration: Duration) {
        let timestamp = Self::timestamp();
        match outcome {
            StepOutcome::Completed { message } => println!(
                "[{}] {} {} ({})",
                timestamp.dimmed(),
                "✓".green().bold(),
                message,
                format_duration(duration).dimmed()
            ),
            StepOutcome::Skipped { reason } => println!(
                "[{}] {} {} ({})",
                timestamp.dimmed(),
                "⏭".yellow(),
                step.label(),
                reason.dimmed()
            ),
            StepOutcome::Tolerated { output } => println!(
                "[{}] {} {} 既に適用済みとみなします: {}",
                timestamp.dimmed(),
                "⚠".yellow(),
                step.label(),
                first_line(output).dimmed()
            ),
        }

        self.current_step = None;
        self.step_results.push((
            step,
            StepResult::Finished {
                outcome: outcome.clone(),
                duration,
            },
        ));
    }

    fn step_failed(&mut self, step: StepKind, error: &BootstrapError) {
        let duration = self
            .current_step
            .take()
            .map(|(_, start)| start.elapsed())
            .unwrap_or_default();

        println!(
            "[{}] {} {}: {}",
            Self::timestamp().dimmed(),
            "✗".red().bold(),
            step.label(),
            first_line(&error.to_string()).red()
        );

        self.step_results.push((
            step,
            StepResult::Failed {
                error: error.to_string(),
                duration,
            },
        ));
    }

    fn detail(&mut self, message: &str) {
        println!("[{}]   → {}", Self::timestamp().dimmed(), message.cyan());
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

/// Duration を読みやすい形式にフォーマット
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let minutes = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", minutes, secs)
    } else if total_secs >= 1 {
        format!("{}.{}s", total_secs, millis / 100)
    } else {
        format!("{}ms", millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
    }

    #[test]
    fn test_records_outcomes() {
        let mut logger = SetupLogger::new();
        logger.step_started(StepKind::EnsureProject);
        logger.step_finished(
            StepKind::EnsureProject,
            &StepOutcome::skipped("project acme-1 already exists"),
            Duration::from_millis(120),
        );
        logger.step_started(StepKind::EnableServices);
        logger.detail("enabling firestore.googleapis.com");
        logger.step_finished(
            StepKind::EnableServices,
            &StepOutcome::completed("enabled firestore.googleapis.com"),
            Duration::from_secs(3),
        );
        assert_eq!(logger.step_results.len(), 2);
        assert!(logger.current_step.is_none());

        logger.step_started(StepKind::AddFirebase);
        logger.step_failed(
            StepKind::AddFirebase,
            &BootstrapError::ToolNotFound("firebase".to_string()),
        );
        assert!(matches!(
            logger.step_results[2].1,
            StepResult::Failed { ref error, .. } if error.contains("firebase")
        ));
        logger.print_summary("acme-1");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("[Deploy] command failed\ndetails"), "[Deploy] command failed");
        assert_eq!(first_line(""), "");
    }
}
