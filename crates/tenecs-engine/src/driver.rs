//! Program check driver
//!
//! Binding runs sequentially and produces an immutable symbol table. Each
//! top-level declaration is then checked on its own, either inline or on a
//! named worker thread. Workers only share the table (behind an `Arc`) and
//! report back over a channel into a slot indexed by declaration, so the
//! resulting program and error list are in source order no matter which
//! worker finishes first.
//!
//! The wait for each worker is bounded. A worker that misses its deadline
//! is reported as a `Timeout` and left to finish in the background; its
//! late result is discarded.

use crate::checker::binder::{bind, BoundDeclaration};
use crate::checker::{CheckError, Scope, SymbolTable, TypeChecker};
use crate::config::CheckerConfig;
use crate::find::{find_runnables, find_tests, FoundTests, Runnables};
use crate::program::{self, Program};
use crate::syntax::{self as ast, SourceFile};
use crate::types::VariableType;
use crossbeam::channel::{self, RecvTimeoutError};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A successfully checked program
#[derive(Debug, Clone)]
pub struct CheckOutput {
    pub program: Program,
    pub tests: FoundTests,
    pub runnables: Runnables,
}

/// Check a single file
pub fn check_file(file: SourceFile, config: &CheckerConfig) -> Result<CheckOutput, Vec<CheckError>> {
    check_files(vec![file], config)
}

/// Check all files of one package
///
/// Returns every declaration error in source order, or just the global
/// error that stopped binding.
pub fn check_files(files: Vec<SourceFile>, config: &CheckerConfig) -> Result<CheckOutput, Vec<CheckError>> {
    let started = Instant::now();
    let bound = bind(&files)?;
    let table = Arc::new(bound.table);
    info!(
        package = %table.package,
        declarations = bound.declarations.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "bound package"
    );

    // names whose type is unknown; references to them report as undeterminable
    let unbound: Arc<FxHashSet<String>> = Arc::new(
        bound
            .declarations
            .iter()
            .filter(|d| d.result.is_err())
            .map(|d| d.name.text.clone())
            .collect(),
    );

    let mut outcomes: Vec<Option<Result<program::Declaration, CheckError>>> = Vec::with_capacity(bound.declarations.len());
    let mut jobs = Vec::new();
    let mut spans = Vec::new();
    for (index, BoundDeclaration { file, name, span, result }) in bound.declarations.into_iter().enumerate() {
        match result {
            Ok((declaration, variable_type)) => {
                outcomes.push(None);
                spans.push((index, file.clone(), name.text.clone(), span));
                let table = Arc::clone(&table);
                let unbound = Arc::clone(&unbound);
                jobs.push(Job {
                    name: name.text,
                    run: move || check_declaration(&table, &file, &declaration, &variable_type, &unbound),
                });
            }
            Err(error) => outcomes.push(Some(Err(error))),
        }
    }

    let limits = Limits {
        parallel: config.parallel,
        max_workers: config.max_workers.max(1),
        timeout: Duration::from_millis(config.timeout_ms),
        fail_fast: config.fail_fast,
    };
    let results = run_bounded(jobs, &limits, |result: &Result<program::Declaration, CheckError>| result.is_err());
    for ((index, file, name, span), outcome) in spans.into_iter().zip(results) {
        outcomes[index] = match outcome {
            Outcome::Done(result) => Some(result),
            Outcome::TimedOut => Some(Err(CheckError::timeout(file, span, &name, config.timeout_ms))),
            Outcome::Skipped => None,
        };
    }

    let mut declarations = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    for outcome in outcomes.into_iter().flatten() {
        match outcome {
            Ok(declaration) => declarations.push(declaration),
            Err(error) => errors.push(error),
        }
    }
    if config.fail_fast {
        errors.truncate(1);
    }
    if !errors.is_empty() {
        info!(errors = errors.len(), elapsed_ms = started.elapsed().as_millis() as u64, "check failed");
        return Err(errors);
    }

    let program = assemble(&table, declarations);
    let tests = find_tests(&program);
    let runnables = find_runnables(&program);
    info!(
        declarations = program.declarations.len(),
        tests = tests.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "check finished"
    );
    Ok(CheckOutput {
        program,
        tests,
        runnables,
    })
}

fn check_declaration(
    table: &SymbolTable,
    file: &str,
    declaration: &ast::Declaration,
    variable_type: &VariableType,
    unbound: &FxHashSet<String>,
) -> Result<program::Declaration, CheckError> {
    let scope = Scope::new(table, file).with_pending(unbound);
    TypeChecker::new(scope).check_top_level(declaration, variable_type)
}

fn assemble(table: &SymbolTable, declarations: Vec<program::Declaration>) -> Program {
    Program {
        package: table.package.clone(),
        declarations,
        type_aliases: table.type_aliases.clone(),
        struct_functions: table.struct_functions.clone(),
        native_functions: table.native_functions.clone(),
        native_function_packages: table.native_function_packages.clone(),
        fields_by_type: table.all_fields().clone(),
        struct_type_argument_match_fields: table.match_fields().clone(),
    }
}

// ============================================================================
// Bounded scheduler
// ============================================================================

/// A named unit of work
pub(crate) struct Job<F> {
    pub name: String,
    pub run: F,
}

pub(crate) struct Limits {
    pub parallel: bool,
    pub max_workers: usize,
    pub timeout: Duration,
    pub fail_fast: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome<T> {
    Done(T),
    /// No result before the deadline
    TimedOut,
    /// Never waited for, after a fail-fast stop
    Skipped,
}

/// Run `jobs`, at most `max_workers` at once, each with its own deadline
///
/// Outcomes are positional. `failed` decides what stops a fail-fast run.
pub(crate) fn run_bounded<T, F>(jobs: Vec<Job<F>>, limits: &Limits, failed: impl Fn(&T) -> bool) -> Vec<Outcome<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let mut outcomes: Vec<Outcome<T>> = jobs.iter().map(|_| Outcome::Skipped).collect();

    if !limits.parallel {
        for (index, job) in jobs.into_iter().enumerate() {
            let result = (job.run)();
            let stop = limits.fail_fast && failed(&result);
            outcomes[index] = Outcome::Done(result);
            if stop {
                break;
            }
        }
        return outcomes;
    }

    let (tx, rx) = channel::unbounded::<(usize, T)>();
    let mut queue: VecDeque<(usize, Job<F>)> = jobs.into_iter().enumerate().collect();
    let mut deadlines: FxHashMap<usize, Instant> = FxHashMap::default();
    let mut stopped = false;

    while !stopped {
        while deadlines.len() < limits.max_workers {
            let (index, job) = match queue.pop_front() {
                Some(next) => next,
                None => break,
            };
            match spawn_worker(index, job, tx.clone()) {
                Ok(()) => {
                    deadlines.insert(index, Instant::now() + limits.timeout);
                }
                Err(job) => {
                    warn!(index, "could not spawn worker, checking inline");
                    let result = (job.run)();
                    stopped = limits.fail_fast && failed(&result);
                    outcomes[index] = Outcome::Done(result);
                    if stopped {
                        break;
                    }
                }
            }
        }
        if stopped || deadlines.is_empty() {
            break;
        }

        let earliest = deadlines.values().min().copied().unwrap_or_else(Instant::now);
        match rx.recv_timeout(earliest.saturating_duration_since(Instant::now())) {
            Ok((index, result)) => {
                // late results of timed-out workers are dropped
                if deadlines.remove(&index).is_some() {
                    stopped = limits.fail_fast && failed(&result);
                    outcomes[index] = Outcome::Done(result);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                let now = Instant::now();
                let expired: Vec<usize> = deadlines
                    .iter()
                    .filter(|(_, deadline)| **deadline <= now)
                    .map(|(index, _)| *index)
                    .collect();
                for index in expired {
                    warn!(index, timeout_ms = limits.timeout.as_millis() as u64, "declaration check timed out");
                    deadlines.remove(&index);
                    outcomes[index] = Outcome::TimedOut;
                }
                stopped = limits.fail_fast;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    if stopped {
        debug!(abandoned = deadlines.len() + queue.len(), "stopped at first failure");
    }
    outcomes
}

/// Start `job` on a named thread; hands the job back if the thread cannot start
fn spawn_worker<T, F>(index: usize, job: Job<F>, tx: channel::Sender<(usize, T)>) -> Result<(), Job<F>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let Job { name, run } = job;
    let slot = Arc::new(Mutex::new(Some(run)));
    let worker_slot = Arc::clone(&slot);
    let spawned = thread::Builder::new()
        .name(format!("tenecs-check-{}", name))
        .spawn(move || {
            let run = worker_slot.lock().take();
            if let Some(run) = run {
                // the receiver is gone once the driver stopped waiting
                let _ = tx.send((index, run()));
            }
        });
    match spawned {
        Ok(_) => {
            debug!(index, worker = %name, "spawned worker");
            Ok(())
        }
        Err(_) => match slot.lock().take() {
            Some(run) => Err(Job { name, run }),
            None => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(parallel: bool, max_workers: usize, timeout_ms: u64, fail_fast: bool) -> Limits {
        Limits {
            parallel,
            max_workers,
            timeout: Duration::from_millis(timeout_ms),
            fail_fast,
        }
    }

    fn job(name: &str, sleep_ms: u64, value: i32) -> Job<impl FnOnce() -> i32 + Send + 'static> {
        Job {
            name: name.to_string(),
            run: move || {
                thread::sleep(Duration::from_millis(sleep_ms));
                value
            },
        }
    }

    #[test]
    fn test_spawned_worker_runs_its_job_once() {
        let (tx, rx) = channel::unbounded();
        let spawned = spawn_worker(7, job("single", 0, 42), tx);
        assert!(spawned.is_ok());
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), (7, 42));
        // the worker dropped its sender after the one result
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_results_are_positional() {
        let jobs = vec![job("slow", 60, 1), job("fast", 0, 2), job("medium", 20, 3)];
        let outcomes = run_bounded(jobs, &limits(true, 4, 5_000, false), |_| false);
        assert_eq!(outcomes, vec![Outcome::Done(1), Outcome::Done(2), Outcome::Done(3)]);
    }

    #[test]
    fn test_worker_cap() {
        let jobs = (0..6).map(|i| job("capped", 10, i)).collect();
        let outcomes = run_bounded(jobs, &limits(true, 2, 5_000, false), |_| false);
        assert_eq!(outcomes, (0..6).map(Outcome::Done).collect::<Vec<_>>());
    }

    #[test]
    fn test_timeout() {
        let jobs = vec![job("stuck", 2_000, 1), job("quick", 0, 2)];
        let outcomes = run_bounded(jobs, &limits(true, 2, 100, false), |_| false);
        assert_eq!(outcomes, vec![Outcome::TimedOut, Outcome::Done(2)]);
    }

    #[test]
    fn test_fail_fast_sequential() {
        let jobs = vec![job("a", 0, 1), job("b", 0, -1), job("c", 0, 3)];
        let outcomes = run_bounded(jobs, &limits(false, 1, 5_000, true), |v: &i32| *v < 0);
        assert_eq!(outcomes, vec![Outcome::Done(1), Outcome::Done(-1), Outcome::Skipped]);
    }

    #[test]
    fn test_fail_fast_parallel_skips_queued() {
        let jobs = vec![job("bad", 0, -1), job("later", 0, 2)];
        let outcomes = run_bounded(jobs, &limits(true, 1, 5_000, true), |v: &i32| *v < 0);
        assert_eq!(outcomes, vec![Outcome::Done(-1), Outcome::Skipped]);
    }
}
