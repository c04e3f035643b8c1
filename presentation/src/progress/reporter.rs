//! Progress reporting for comic generation

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use math_comic_application::PipelineProgress;
use math_comic_domain::{ErrorResponse, Stage};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress during a pipeline run with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    stage_bar: Mutex<Option<ProgressBar>>,
    panel_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            stage_bar: Mutex::new(None),
            panel_bar: Mutex::new(None),
        }
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-")
    }

    fn panel_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("  {prefix:.bold} [{bar:30.yellow/white}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-")
    }

    fn stage_bar(&self) -> Option<ProgressBar> {
        let mut slot = self.stage_bar.lock().ok()?;
        let bar = slot.get_or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(Stage::ALL.len() as u64));
            pb.set_style(Self::stage_style());
            pb.set_prefix("Comic");
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });
        Some(bar.clone())
    }

    fn finish_panels(&self, success: bool) {
        if let Some(pb) = self.panel_bar.lock().ok().and_then(|mut b| b.take()) {
            if success {
                pb.finish_with_message("done".green().to_string());
            } else {
                pb.abandon_with_message("stopped".red().to_string());
            }
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineProgress for ProgressReporter {
    fn on_stage_start(&self, stage: &Stage) {
        if let Some(pb) = self.stage_bar() {
            pb.set_message(format!("{}...", stage.display_name()));
        }
    }

    fn on_stage_complete(&self, stage: &Stage, success: bool) {
        let Some(pb) = self.stage_bar() else {
            return;
        };

        if *stage == Stage::ImageRendering {
            self.finish_panels(success);
        }

        if !success {
            pb.abandon_with_message(format!("{} {}", "x".red(), stage.display_name()));
            return;
        }

        pb.inc(1);
        if *stage == Stage::Storage {
            pb.finish_with_message(format!("{}", "Comic ready!".green()));
        } else {
            pb.set_message(format!("{} {}", "v".green(), stage.display_name()));
        }
    }

    fn on_retry(&self, attempt: u32, delay: Duration, reason: &ErrorResponse) {
        if let Some(pb) = self.stage_bar() {
            pb.set_message(format!(
                "{} {} (attempt {} failed, retrying in {:.1}s)",
                "!".yellow(),
                reason.user_message,
                attempt,
                delay.as_secs_f64()
            ));
        }
    }

    fn on_panel_complete(&self, panel_number: usize, total: usize) {
        let Ok(mut slot) = self.panel_bar.lock() else {
            return;
        };
        let pb = slot.get_or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::panel_style());
            pb.set_prefix("Panels");
            pb
        });
        pb.set_message(format!("{} panel {}", "v".green(), panel_number));
        pb.inc(1);
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl PipelineProgress for SimpleProgress {
    fn on_stage_start(&self, stage: &Stage) {
        eprintln!(
            "{} {} ({}/{})",
            "->".cyan(),
            stage.display_name().bold(),
            stage.position(),
            Stage::ALL.len()
        );
    }

    fn on_stage_complete(&self, stage: &Stage, success: bool) {
        if !success {
            eprintln!("  {} {} (failed)", "x".red(), stage.display_name());
        }
    }

    fn on_retry(&self, attempt: u32, delay: Duration, reason: &ErrorResponse) {
        eprintln!(
            "  {} attempt {}: {} (retrying in {:.1}s)",
            "!".yellow(),
            attempt,
            reason.user_message,
            delay.as_secs_f64()
        );
    }

    fn on_panel_complete(&self, panel_number: usize, total: usize) {
        eprintln!("  {} panel {}/{}", "v".green(), panel_number, total);
    }
}
