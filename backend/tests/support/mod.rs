#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use splan::api::{ClockTime, DayOfWeek, NewCourse, NewTimetable, TimetableId};
use splan::db::repositories::LocalRepository;
use splan::db::services;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores variables on unwind and serializes access to the process-global
/// environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn clock(s: &str) -> ClockTime {
    ClockTime::parse(s).unwrap()
}

pub fn course(name: &str, day: DayOfWeek, start: &str, end: &str) -> NewCourse {
    NewCourse::new(name, day, clock(start), clock(end))
}

/// A fresh repository holding one timetable.
pub async fn repo_with_timetable(name: &str) -> (LocalRepository, TimetableId) {
    let repo = LocalRepository::new();
    let timetable = services::create_timetable(&repo, NewTimetable::named(name))
        .await
        .unwrap();
    (repo, timetable.id)
}

/// Monday-morning courses: two overlapping lectures in the same room and one
/// later seminar.
pub fn monday_courses() -> Vec<NewCourse> {
    vec![
        course("Analysis I", DayOfWeek::MONDAY, "08:00", "09:30").with_room("H1"),
        course("Linear Algebra", DayOfWeek::MONDAY, "09:00", "10:30").with_room(" H1 "),
        course("Seminar", DayOfWeek::MONDAY, "10:30", "12:00"),
    ]
}
