//! Executes a [`Plan`] with bounded parallelism.
//!
//! Each task runs on tokio's blocking pool with its own OS-seeded `StdRng`;
//! a `Semaphore` caps how many archives are written at once. All tasks are
//! submitted up front. A failed task is reported and never retried, and it
//! does not affect its siblings.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use dd_config::GenConfig;
use orion_error::StructError;
use orion_error::ErrorOwe;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{GenError, GenReason, GenResult};
use crate::model::CategoryModel;
use crate::output::archive::write_archive;
use crate::partition::{ArchiveLayout, GenerationTask, Plan, plan};
use crate::synth::TimeWindow;

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub num_workers: usize,
    pub lookback: TimeDelta,
    pub compression_level: u32,
    /// Fixed window end; `None` means "now" at each task's start.
    pub anchor: Option<DateTime<Utc>>,
}

impl RunOptions {
    pub fn from_config(config: &GenConfig) -> GenResult<Self> {
        let lookback = TimeDelta::from_std(config.run.lookback.as_duration()).owe_conf()?;
        Ok(Self {
            num_workers: config.run.num_workers,
            lookback,
            compression_level: config.output.compression_level,
            anchor: None,
        })
    }

    fn window(&self) -> TimeWindow {
        TimeWindow::ending_at(self.anchor.unwrap_or_else(Utc::now), self.lookback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task: GenerationTask,
    pub records: u64,
}

#[derive(Debug)]
pub struct TaskFailure {
    pub task: GenerationTask,
    pub error: GenError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Sorted by task index.
    pub outcomes: Vec<TaskOutcome>,
    /// Sorted by task index.
    pub failures: Vec<TaskFailure>,
}

impl RunReport {
    pub fn total_messages(&self) -> u64 {
        self.outcomes.iter().map(|o| o.records).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn sort(&mut self) {
        self.outcomes.sort_by_key(|o| o.task.index);
        self.failures.sort_by_key(|f| f.task.index);
    }

    fn record(&mut self, task: GenerationTask, result: GenResult<u64>) {
        match result {
            Ok(records) => self.outcomes.push(TaskOutcome { task, records }),
            Err(error) => {
                dd_error!(gen, path = %task.path.display(), error = %error, "archive generation failed");
                self.failures.push(TaskFailure { task, error });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Single task
// ---------------------------------------------------------------------------

/// Write one archive. The timestamp window is fixed here, at task start.
pub fn run_task<R: Rng>(
    task: &GenerationTask,
    model: &CategoryModel,
    opts: &RunOptions,
    rng: &mut R,
) -> GenResult<u64> {
    let window = opts.window();
    dd_info!(gen, path = %task.path.display(), messages = task.messages, "writing archive");

    let written = write_archive(
        &task.path,
        task.messages,
        model,
        &window,
        opts.compression_level,
        rng,
    )?;

    dd_debug!(io, path = %task.path.display(), records = written, "archive complete");
    Ok(written)
}

// ---------------------------------------------------------------------------
// Many tasks
// ---------------------------------------------------------------------------

/// Run every task of `plan` concurrently, at most `opts.num_workers` at a time.
pub async fn run_tasks(plan: Plan, model: Arc<CategoryModel>, opts: RunOptions) -> RunReport {
    let semaphore = Arc::new(Semaphore::new(opts.num_workers.max(1)));
    let opts = Arc::new(opts);
    let mut set = JoinSet::new();

    for task in plan.tasks.iter().cloned() {
        let semaphore = Arc::clone(&semaphore);
        let model = Arc::clone(&model);
        let opts = Arc::clone(&opts);

        set.spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    let err = StructError::from(GenReason::Join)
                        .with_detail(format!("worker pool closed: {e}"));
                    return (task, Err(err));
                }
            };

            let job = task.clone();
            let result = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let _span = tracing::info_span!("task", index = job.index).entered();
                let mut rng = StdRng::from_os_rng();
                run_task(&job, &model, &opts, &mut rng)
            })
            .await
            .unwrap_or_else(|e| {
                Err(StructError::from(GenReason::Join)
                    .with_detail(format!("generation task aborted: {e}")))
            });

            (task, result)
        });
    }

    let mut report = RunReport::default();
    let mut reported = HashSet::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((task, result)) => {
                reported.insert(task.index);
                report.record(task, result);
            }
            Err(e) => dd_error!(sys, error = %e, "generation task join failed"),
        }
    }

    for task in plan.tasks {
        if !reported.contains(&task.index) {
            let err = StructError::from(GenReason::Join)
                .with_detail("task did not report".to_string());
            report.record(task, Err(err));
        }
    }

    report.sort();
    report
}

/// Run the tasks one after another on the current thread with one shared
/// generator.
pub fn run_sequential<R: Rng>(
    plan: Plan,
    model: &CategoryModel,
    opts: &RunOptions,
    rng: &mut R,
) -> RunReport {
    let mut report = RunReport::default();
    for task in plan.tasks {
        let result = run_task(&task, model, opts, rng);
        report.record(task, result);
    }
    report.sort();
    report
}

// ---------------------------------------------------------------------------
// Whole run
// ---------------------------------------------------------------------------

/// Create the output directory, plan the archives and write them.
pub async fn run(config: &GenConfig, model: Arc<CategoryModel>) -> GenResult<RunReport> {
    let layout = ArchiveLayout::new(&config.output.dir, &config.output.file_prefix);
    std::fs::create_dir_all(layout.dir()).map_err(|e| {
        StructError::from(GenReason::Io)
            .with_detail(format!("create directory {}: {e}", layout.dir().display()))
    })?;

    let work = plan(
        &layout,
        config.run.num_files,
        config.run.messages_per_file,
        config.run.jitter,
        &mut rand::rng(),
    );
    let planned_total = work.total_messages();
    let planned_files = work.len();
    dd_info!(
        gen,
        files = planned_files,
        messages = planned_total,
        workers = config.run.num_workers,
        dir = %layout.dir().display(),
        "generation planned"
    );

    let opts = RunOptions::from_config(config)?;
    let report = run_tasks(work, model, opts).await;

    if report.is_success() {
        dd_info!(
            sys,
            "wrote {} messages across {} files",
            report.total_messages(),
            planned_files
        );
    } else {
        dd_warn!(
            sys,
            failed = report.failures.len(),
            "wrote {} messages across {} of {} files",
            report.total_messages(),
            report.outcomes.len(),
            planned_files
        );
    }
    Ok(report)
}
