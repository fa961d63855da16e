use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::{SubsecRound, TimeDelta, TimeZone, Utc};
use dd_config::GenConfig;
use dd_datagen::inspect::{ArchiveRecord, decompress, read_records, summarize};
use dd_datagen::model::CategoryModel;
use dd_datagen::partition::{ArchiveLayout, GenerationTask, Plan, plan};
use dd_datagen::runner::{self, RunOptions, run_sequential, run_tasks};
use rand::SeedableRng;
use rand::rngs::StdRng;

const REQUIRED_KEYS: [&str; 6] = ["app", "context", "latency", "messageId", "timestamp", "type"];

fn small_config(dir: &Path) -> GenConfig {
    let mut config = GenConfig::default();
    config.output.dir = dir.to_path_buf();
    config.run.num_files = 3;
    config.run.num_workers = 2;
    config.run.messages_per_file = 100;
    config
}

fn anchored(workers: usize) -> RunOptions {
    RunOptions {
        num_workers: workers,
        lookback: TimeDelta::days(10),
        compression_level: 6,
        anchor: Some(Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap()),
    }
}

fn app_tally(records: &[ArchiveRecord]) -> BTreeMap<String, usize> {
    summarize(records).apps
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn three_files_of_about_one_hundred_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path());
    let model = Arc::new(CategoryModel::builtin().unwrap());

    let before = Utc::now().trunc_subsecs(0);
    let report = runner::run(&config, Arc::clone(&model)).await.unwrap();
    let after = Utc::now();

    assert!(report.is_success());
    assert_eq!(report.outcomes.len(), 3);

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["archives_00.gz", "archives_01.gz", "archives_02.gz"]);

    let mut total = 0;
    for outcome in &report.outcomes {
        let text = decompress(&outcome.task.path).unwrap();
        assert!(!text.ends_with('\n'));
        let lines: Vec<&str> = text.split('\n').collect();
        assert!((90..=110).contains(&lines.len()), "{} lines", lines.len());
        assert_eq!(lines.len() as u64, outcome.records);
        total += outcome.records;

        for line in lines {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            let obj = v.as_object().unwrap();
            for key in REQUIRED_KEYS {
                assert!(obj.contains_key(key), "missing {key}: {line}");
            }
            assert!(v["context"]["os"].is_string());
            assert!(v["context"]["version"].is_string());
            assert_eq!(v["messageId"].as_str().unwrap().len(), 20);
            assert!(v["latency"].as_f64().unwrap() >= 0.0);
        }

        for record in read_records(&outcome.task.path).unwrap() {
            let ts = record.parsed_timestamp().unwrap();
            assert!(ts >= before - TimeDelta::days(10));
            assert!(ts <= after);
            let app = model.app(&record.app).unwrap();
            let os = app.os(&record.context.os).unwrap();
            assert!(os.versions.iter().any(|v| v.name == record.context.version));
            assert!(app.event_type(&record.event_type).is_some());
        }
    }
    assert_eq!(report.total_messages(), total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sequential_and_parallel_runs_agree() {
    let seq_dir = tempfile::tempdir().unwrap();
    let par_dir = tempfile::tempdir().unwrap();
    let model = Arc::new(CategoryModel::builtin().unwrap());

    let mut rng = StdRng::seed_from_u64(2024);
    let base = plan(
        &ArchiveLayout::new(seq_dir.path(), "archives"),
        6,
        2_000,
        0.1,
        &mut rng,
    );
    let parallel_plan = base.relocate(&ArchiveLayout::new(par_dir.path(), "archives"));

    let sequential = run_sequential(base.clone(), &model, &anchored(1), &mut rng);
    let parallel = run_tasks(parallel_plan, Arc::clone(&model), anchored(4)).await;

    assert!(sequential.is_success() && parallel.is_success());
    let seq_counts: Vec<u64> = sequential.outcomes.iter().map(|o| o.records).collect();
    let par_counts: Vec<u64> = parallel.outcomes.iter().map(|o| o.records).collect();
    let planned: Vec<u64> = base.tasks.iter().map(|t| t.messages).collect();
    assert_eq!(seq_counts, planned);
    assert_eq!(par_counts, planned);

    let mut seq_records = Vec::new();
    let mut par_records = Vec::new();
    for (s, p) in sequential.outcomes.iter().zip(&parallel.outcomes) {
        seq_records.extend(read_records(&s.task.path).unwrap());
        par_records.extend(read_records(&p.task.path).unwrap());
    }
    assert_eq!(seq_records.len(), par_records.len());

    // Two-sample chi-square on the app mix; 3 degrees of freedom, alpha = 0.001.
    let seq = app_tally(&seq_records);
    let par = app_tally(&par_records);
    let n = seq_records.len() as f64;
    let mut chi2 = 0.0;
    for app in &model.apps {
        let a = seq.get(&app.name).copied().unwrap_or(0) as f64;
        let b = par.get(&app.name).copied().unwrap_or(0) as f64;
        if a + b > 0.0 {
            chi2 += (a - b).powi(2) / (a + b);
        }
    }
    assert!(chi2 < 16.266, "chi-square {chi2}: {seq:?} vs {par:?} over {n} records");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_tasks_draw_independent_streams() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArchiveLayout::new(dir.path(), "archives");
    let model = Arc::new(CategoryModel::builtin().unwrap());
    let work = Plan {
        tasks: (0..6)
            .map(|index| GenerationTask {
                index,
                path: layout.path_for(index),
                messages: 600,
            })
            .collect(),
    };

    let report = run_tasks(work, Arc::clone(&model), anchored(6)).await;
    assert!(report.is_success());

    let archives: Vec<Vec<ArchiveRecord>> = report
        .outcomes
        .iter()
        .map(|o| read_records(&o.task.path).unwrap())
        .collect();

    let ids: Vec<HashSet<&str>> = archives
        .iter()
        .map(|records| records.iter().map(|r| r.message_id.as_str()).collect())
        .collect();
    for (i, a) in ids.iter().enumerate() {
        assert_eq!(a.len(), 600, "duplicate ids inside archive {i}");
        for (j, b) in ids.iter().enumerate().skip(i + 1) {
            assert!(a.is_disjoint(b), "archives {i} and {j} share message ids");
        }
    }

    let fields = |records: &[ArchiveRecord]| -> Vec<(String, String, String, String)> {
        records
            .iter()
            .map(|r| {
                (
                    r.app.clone(),
                    r.event_type.clone(),
                    r.context.os.clone(),
                    r.context.version.clone(),
                )
            })
            .collect()
    };
    let sequences: Vec<_> = archives.iter().map(|r| fields(r)).collect();
    let latencies: Vec<Vec<u64>> = archives
        .iter()
        .map(|records| records.iter().map(|r| r.latency.to_bits()).collect())
        .collect();
    for i in 0..archives.len() {
        for j in i + 1..archives.len() {
            assert_ne!(sequences[i], sequences[j], "archives {i} and {j} repeat categories");
            assert_ne!(latencies[i], latencies[j], "archives {i} and {j} repeat latencies");
        }
    }

    // Pairwise two-sample chi-square on the app mix, 3 degrees of freedom.
    // 25.9 is roughly p = 1e-5 per pair, enough margin across 15 pairs.
    let tallies: Vec<BTreeMap<String, usize>> = archives.iter().map(|r| app_tally(r)).collect();
    for i in 0..tallies.len() {
        for j in i + 1..tallies.len() {
            let mut chi2 = 0.0;
            for app in &model.apps {
                let a = tallies[i].get(&app.name).copied().unwrap_or(0) as f64;
                let b = tallies[j].get(&app.name).copied().unwrap_or(0) as f64;
                if a + b > 0.0 {
                    chi2 += (a - b).powi(2) / (a + b);
                }
            }
            assert!(chi2 < 25.9, "archives {i} and {j}: chi-square {chi2}");
        }
    }
}

#[tokio::test]
async fn zero_messages_produce_empty_archives() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = small_config(dir.path());
    config.run.messages_per_file = 0;

    let report = runner::run(&config, Arc::new(CategoryModel::builtin().unwrap()))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.total_messages(), 0);
    for outcome in &report.outcomes {
        assert_eq!(decompress(&outcome.task.path).unwrap(), "");
        assert!(read_records(&outcome.task.path).unwrap().is_empty());
    }
}
