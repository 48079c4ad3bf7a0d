mod common;

use std::fs;

use common::*;
use crawler_core::{CveId, Outcome, StorageFailurePolicy, WorkUnit};
use crawler_engine::{CursorStore, FetchEngine, FileCursorStore, MissingUnitLog};
use engine_logging::FeedLog;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const CURSOR: &str = ".last_cve.txt";

fn engine(
    temp: &TempDir,
    feed: ScriptedFeed,
    max_retries: u32,
    sleeper: std::sync::Arc<RecordingSleeper>,
) -> FetchEngine<ScriptedFeed> {
    FetchEngine::new(
        feed,
        file_stores(temp.path(), CURSOR),
        policy(max_retries),
        sleeper,
        FeedLog::new("test"),
    )
}

fn saved_cursor(temp: &TempDir) -> Option<CveId> {
    FileCursorStore::<CveId>::new(temp.path().join(CURSOR), FeedLog::new("test")).load()
}

fn missing(temp: &TempDir) -> Vec<String> {
    MissingUnitLog::new(temp.path().join("missing_units.txt"))
        .entries()
        .unwrap()
}

#[tokio::test]
async fn rate_limited_unit_is_retried_after_cooldown_without_using_retry_budget() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(1).script(
        1,
        vec![
            Outcome::RateLimited,
            Outcome::RateLimited,
            Outcome::Success("{\"id\":1}".into()),
        ],
    );
    let sleeper = RecordingSleeper::new();
    let mut engine = engine(&temp, feed, 1, sleeper.clone());

    let report = engine.run_from(None, date(2020, 6, 1)).await.unwrap();

    assert_eq!(engine.plugin().requests(), vec![CveId::new(2020, 1); 3]);
    assert_eq!(sleeper.count(COOLDOWN), 2);
    assert_eq!(sleeper.count(BACKOFF), 0);
    assert_eq!(report.stored, 1);
    assert_eq!(report.rate_limited, 2);
    assert_eq!(report.retries, 0);
    assert!(missing(&temp).is_empty());
    assert_eq!(saved_cursor(&temp), Some(CveId::new(2020, 1)));
}

#[tokio::test]
async fn exhausted_unit_is_logged_as_missing_and_skipped() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(2)
        .script(
            1,
            vec![
                Outcome::Transient("503".into()),
                Outcome::Transient("503".into()),
                Outcome::Transient("503".into()),
                Outcome::Success("never reached".into()),
            ],
        )
        .script(2, vec![Outcome::Success("{\"id\":2}".into())]);
    let sleeper = RecordingSleeper::new();
    let mut engine = engine(&temp, feed, 3, sleeper.clone());

    let report = engine.run_from(None, date(2020, 6, 1)).await.unwrap();

    let requests = engine.plugin().requests();
    assert_eq!(
        requests.iter().filter(|id| **id == CveId::new(2020, 1)).count(),
        3
    );
    assert_eq!(requests.last(), Some(&CveId::new(2020, 2)));
    assert_eq!(missing(&temp), vec!["CVE-2020-0001".to_string()]);
    assert_eq!(sleeper.count(BACKOFF), 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.stored, 1);
    assert_eq!(report.retries, 2);
    assert_eq!(saved_cursor(&temp), Some(CveId::new(2020, 2)));
}

#[tokio::test]
async fn resume_continues_after_saved_cursor() {
    init_logging();
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(CURSOR), "2020,42").unwrap();
    let feed = ScriptedFeed::new(45);
    let mut engine = engine(&temp, feed, 3, RecordingSleeper::new());

    let after = engine.resume_point();
    assert_eq!(after, Some(CveId::new(2020, 42)));
    let report = engine.run_from(after, date(2020, 6, 1)).await.unwrap();

    assert_eq!(
        engine.plugin().requests(),
        vec![
            CveId::new(2020, 43),
            CveId::new(2020, 44),
            CveId::new(2020, 45)
        ]
    );
    assert_eq!(report.absent, 3);
    assert_eq!(saved_cursor(&temp), Some(CveId::new(2020, 45)));
}

#[tokio::test]
async fn cursor_never_moves_behind_the_resume_point() {
    init_logging();
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(CURSOR), "2020,5").unwrap();
    let feed = ScriptedFeed::new(6).script(2, vec![Outcome::Success("{}".into())]);
    let mut engine = engine(&temp, feed, 3, RecordingSleeper::new());

    // A pass starting at the beginning must not rewind the stored cursor.
    engine.run_from(Some(CveId::new(2020, 5)), date(2020, 6, 1)).await.unwrap();
    assert_eq!(saved_cursor(&temp), Some(CveId::new(2020, 6)));

    engine.run_from(None, date(2020, 6, 1)).await.unwrap();
    assert_eq!(saved_cursor(&temp), Some(CveId::new(2020, 6)));
}

#[tokio::test]
async fn cursor_is_saved_after_every_unit() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(3).script(3, vec![Outcome::Success("{\"n\":3}".into())]);
    let sleeper = RecordingSleeper::new();
    let mut engine = engine(&temp, feed, 3, sleeper.clone());

    let report = engine.run_from(None, date(2020, 6, 1)).await.unwrap();

    assert_eq!(report.processed(), 3);
    assert_eq!(report.last, Some(CveId::new(2020, 3)));
    assert_eq!(sleeper.count(PACING), 3);
    let cursor = fs::read_to_string(temp.path().join(CURSOR)).unwrap();
    assert_eq!(cursor, CveId::new(2020, 3).to_cursor());
    let written = fs::read_to_string(temp.path().join("2020/01/2020_01_01.jsonl")).unwrap();
    assert_eq!(written, "{\"n\":3}\n");
}

#[tokio::test]
async fn storage_failure_skips_unit_when_policy_says_so() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(2)
        .failing_writes(1)
        .script(1, vec![Outcome::Success("{}".into())])
        .script(2, vec![Outcome::Success("{\"ok\":true}".into())]);
    let mut engine = engine(&temp, feed, 3, RecordingSleeper::new());

    let report = engine.run_from(None, date(2020, 6, 1)).await.unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.stored, 1);
    assert_eq!(missing(&temp), vec!["CVE-2020-0001".to_string()]);
    assert_eq!(engine.plugin().requests().len(), 2);
}

#[tokio::test]
async fn storage_failure_retries_unit_when_policy_says_so() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(1)
        .with_storage_policy(StorageFailurePolicy::RetryUnit)
        .failing_writes(1)
        .script(
            1,
            vec![
                Outcome::Success("{\"try\":1}".into()),
                Outcome::Success("{\"try\":2}".into()),
            ],
        );
    let sleeper = RecordingSleeper::new();
    let mut engine = engine(&temp, feed, 3, sleeper.clone());

    let report = engine.run_from(None, date(2020, 6, 1)).await.unwrap();

    assert_eq!(report.stored, 1);
    assert_eq!(report.retries, 1);
    assert_eq!(sleeper.count(BACKOFF), 1);
    assert!(missing(&temp).is_empty());
    let written = fs::read_to_string(temp.path().join("2020/01/2020_01_01.jsonl")).unwrap();
    assert_eq!(written, "{\"try\":2}\n");
}

#[tokio::test]
async fn fatal_outcome_halts_the_pass() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(3).script(2, vec![Outcome::Fatal("revoked".into())]);
    let mut engine = engine(&temp, feed, 3, RecordingSleeper::new());

    let halt = engine.run_from(None, date(2020, 6, 1)).await.unwrap_err();

    assert_eq!(halt.unit, "CVE-2020-0002");
    assert_eq!(halt.reason, "revoked");
    assert_eq!(engine.plugin().requests().len(), 2);
    assert_eq!(saved_cursor(&temp), Some(CveId::new(2020, 1)));
}

/// Reference model of one unit's fate under a retry budget of three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fate {
    Stored,
    Absent,
    Skipped,
}

fn expected_fate(script: &[Outcome<String>]) -> Fate {
    let mut failures = 0;
    for outcome in script {
        match outcome {
            Outcome::Success(_) => return Fate::Stored,
            Outcome::NotFound => return Fate::Absent,
            Outcome::RateLimited => {}
            Outcome::Transient(_) => {
                failures += 1;
                if failures == 3 {
                    return Fate::Skipped;
                }
            }
            Outcome::Fatal(_) => unreachable!("generated scripts never halt"),
        }
    }
    Fate::Absent
}

fn generated_script(seed: &mut u64) -> Vec<Outcome<String>> {
    let mut next = || {
        *seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (*seed >> 33) as usize
    };
    let len = next() % 6;
    (0..len)
        .map(|i| match next() % 4 {
            0 => Outcome::Success(format!("{{\"try\":{i}}}")),
            1 => Outcome::RateLimited,
            2 => Outcome::Transient("503".into()),
            _ => Outcome::NotFound,
        })
        .collect()
}

#[tokio::test]
async fn cursor_ends_at_or_after_last_stored_unit_for_generated_scripts() {
    init_logging();
    let mut seed = 0x5eed_u64;
    for case in 0..40 {
        let temp = TempDir::new().unwrap();
        let mut feed = ScriptedFeed::new(4);
        let mut fates = Vec::new();
        for sequence in 1..=4 {
            let script = generated_script(&mut seed);
            fates.push((CveId::new(2020, sequence), expected_fate(&script)));
            feed = feed.script(sequence, script);
        }
        let mut engine = engine(&temp, feed, 3, RecordingSleeper::new());

        let report = engine.run_from(None, date(2020, 6, 1)).await.unwrap();

        let count = |fate: Fate| fates.iter().filter(|(_, f)| *f == fate).count() as u64;
        assert_eq!(report.stored, count(Fate::Stored), "case {case}: {fates:?}");
        assert_eq!(report.absent, count(Fate::Absent), "case {case}: {fates:?}");
        assert_eq!(report.skipped, count(Fate::Skipped), "case {case}: {fates:?}");

        let cursor = saved_cursor(&temp);
        let last_stored = fates
            .iter()
            .filter(|(_, fate)| *fate == Fate::Stored)
            .map(|(id, _)| *id)
            .last();
        assert!(cursor >= last_stored, "case {case}: {cursor:?} < {last_stored:?}");
        assert_eq!(cursor, Some(CveId::new(2020, 4)), "case {case}");

        let skipped: Vec<String> = fates
            .iter()
            .filter(|(_, fate)| *fate == Fate::Skipped)
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(missing(&temp), skipped, "case {case}");
    }
}
