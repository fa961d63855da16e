use std::path::{Path, PathBuf};

use rand::Rng;

use crate::output::archive::ARCHIVE_EXTENSION;

/// One archive to produce. Created by [`plan`], consumed by exactly one
/// writer; tasks share nothing, so they can run in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    pub index: usize,
    pub path: PathBuf,
    pub messages: u64,
}

/// Where archives go and how they are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    pub dir: PathBuf,
    pub prefix: String,
}

impl ArchiveLayout {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// `<prefix>_<NN>.gz`, index zero-padded to two digits.
    pub fn file_name(&self, index: usize) -> String {
        format!("{}_{index:02}.{ARCHIVE_EXTENSION}", self.prefix)
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(self.file_name(index))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Ordered task list produced by [`plan`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    pub tasks: Vec<GenerationTask>,
}

impl Plan {
    pub fn total_messages(&self) -> u64 {
        self.tasks.iter().map(|t| t.messages).sum()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Same counts, archives placed under another layout.
    pub fn relocate(&self, layout: &ArchiveLayout) -> Plan {
        Plan {
            tasks: self
                .tasks
                .iter()
                .map(|t| GenerationTask {
                    index: t.index,
                    path: layout.path_for(t.index),
                    messages: t.messages,
                })
                .collect(),
        }
    }
}

/// Split the work into `num_files` independent tasks.
///
/// Each archive's count is `round(messages_per_file * u)` with `u` drawn
/// independently per file from `[1 - jitter, 1 + jitter)`.
pub fn plan<R: Rng>(
    layout: &ArchiveLayout,
    num_files: usize,
    messages_per_file: u64,
    jitter: f64,
    rng: &mut R,
) -> Plan {
    let tasks = (0..num_files)
        .map(|index| GenerationTask {
            index,
            path: layout.path_for(index),
            messages: jittered_count(messages_per_file, jitter, rng),
        })
        .collect();
    Plan { tasks }
}

fn jittered_count<R: Rng>(messages_per_file: u64, jitter: f64, rng: &mut R) -> u64 {
    if jitter <= 0.0 {
        return messages_per_file;
    }
    let factor = rng.random_range((1.0 - jitter)..(1.0 + jitter));
    (messages_per_file as f64 * factor).round() as u64
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn layout() -> ArchiveLayout {
        ArchiveLayout::new("/tmp/out", "archives")
    }

    #[test]
    fn file_names_are_zero_padded() {
        let l = layout();
        assert_eq!(l.file_name(0), "archives_00.gz");
        assert_eq!(l.file_name(7), "archives_07.gz");
        assert_eq!(l.file_name(19), "archives_19.gz");
        assert_eq!(l.file_name(123), "archives_123.gz");
        assert_eq!(l.path_for(3), PathBuf::from("/tmp/out/archives_03.gz"));
    }

    #[test]
    fn one_task_per_file_in_index_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = plan(&layout(), 20, 60_000, 0.1, &mut rng);
        assert_eq!(p.len(), 20);
        for (i, t) in p.tasks.iter().enumerate() {
            assert_eq!(t.index, i);
            assert_eq!(t.path, layout().path_for(i));
        }
    }

    #[test]
    fn counts_within_ten_percent() {
        let mut rng = StdRng::seed_from_u64(2);
        let p = plan(&layout(), 500, 100, 0.1, &mut rng);
        for t in &p.tasks {
            assert!((90..=110).contains(&t.messages), "{}", t.messages);
        }
        let distinct: std::collections::HashSet<u64> =
            p.tasks.iter().map(|t| t.messages).collect();
        assert!(distinct.len() > 10, "jitter should vary counts: {distinct:?}");
    }

    #[test]
    fn total_is_sum_of_counts() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = plan(&layout(), 5, 1_000, 0.1, &mut rng);
        let sum: u64 = p.tasks.iter().map(|t| t.messages).sum();
        assert_eq!(p.total_messages(), sum);
    }

    #[test]
    fn zero_jitter_is_exact() {
        let mut rng = StdRng::seed_from_u64(4);
        let p = plan(&layout(), 4, 250, 0.0, &mut rng);
        assert!(p.tasks.iter().all(|t| t.messages == 250));
        assert_eq!(p.total_messages(), 1_000);
    }

    #[test]
    fn zero_files_is_empty_plan() {
        let mut rng = StdRng::seed_from_u64(5);
        let p = plan(&layout(), 0, 100, 0.1, &mut rng);
        assert!(p.is_empty());
        assert_eq!(p.total_messages(), 0);
    }

    #[test]
    fn zero_messages_stays_zero() {
        let mut rng = StdRng::seed_from_u64(6);
        let p = plan(&layout(), 3, 0, 0.1, &mut rng);
        assert!(p.tasks.iter().all(|t| t.messages == 0));
    }

    #[test]
    fn relocate_keeps_counts() {
        let mut rng = StdRng::seed_from_u64(7);
        let p = plan(&layout(), 3, 100, 0.1, &mut rng);
        let other = ArchiveLayout::new("/elsewhere", "events");
        let moved = p.relocate(&other);
        assert_eq!(moved.len(), 3);
        for (a, b) in p.tasks.iter().zip(&moved.tasks) {
            assert_eq!(a.messages, b.messages);
            assert_eq!(b.path, PathBuf::from(format!("/elsewhere/events_{:02}.gz", a.index)));
        }
    }
}
