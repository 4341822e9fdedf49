//! Store contract scenarios shared by the in-memory and Postgres suites.
//!
//! Every scenario works inside its own course bucket so suites can share one
//! database. Stores must be built with a clock fixed to [`YEAR`].

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use rollbook_core::{CourseCode, NewGrade, NewStudent, StudentId, StudentUpdate};
use rollbook_db::{DbError, GradeStore, StudentStore};

pub const YEAR: i32 = 2025;

static COURSE_COUNTER: AtomicU32 = AtomicU32::new(0);
static RUN_SALT: OnceLock<u32> = OnceLock::new();

/// A course code no other scenario in this run, or an earlier run against
/// the same database, will use.
pub fn unique_course(tag: &str) -> String {
    let salt = RUN_SALT.get_or_init(|| {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        (nanos ^ std::process::id()) % 1_000_000
    });
    let n = COURSE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{tag}{salt}X{n}")
}

fn student(name: &str, course: &str) -> NewStudent {
    NewStudent::new(name, course, 1, "A").unwrap()
}

fn sid(course: &str, seq: u32) -> String {
    format!("{:02}{}-{:04}", YEAR % 100, course.to_ascii_uppercase(), seq)
}

pub async fn first_id_in_empty_bucket<S: StudentStore>(store: &S) {
    let course = unique_course("F");
    let created = store.create(student("Ada", &course)).await.unwrap();
    assert_eq!(created.student_id.to_string(), sid(&course, 1));
    assert_eq!(created.course.as_str(), course.to_ascii_uppercase());
}

pub async fn sequential_assignment_has_no_gaps<S: StudentStore>(store: &S) {
    let course = unique_course("S");
    let mut ids = Vec::new();
    for i in 0..5 {
        let created = store.create(student(&format!("Student {i}"), &course)).await.unwrap();
        ids.push(created.student_id.to_string());
    }
    let expected: Vec<String> = (1..=5).map(|seq| sid(&course, seq)).collect();
    assert_eq!(ids, expected);
}

pub async fn course_case_shares_bucket<S: StudentStore>(store: &S) {
    let course = unique_course("C");
    let lower = store
        .create(student("Lower", &course.to_ascii_lowercase()))
        .await
        .unwrap();
    let upper = store
        .create(student("Upper", &course.to_ascii_uppercase()))
        .await
        .unwrap();
    assert_eq!(lower.student_id.to_string(), sid(&course, 1));
    assert_eq!(upper.student_id.to_string(), sid(&course, 2));

    let preview = store
        .next_student_id(&CourseCode::new(&course).unwrap())
        .await
        .unwrap();
    assert_eq!(preview.to_string(), sid(&course, 3));
}

pub async fn next_is_max_plus_one_after_delete<S: StudentStore>(store: &S) {
    let course = unique_course("G");
    let _first = store.create(student("One", &course)).await.unwrap();
    let second = store.create(student("Two", &course)).await.unwrap();
    let _third = store.create(student("Three", &course)).await.unwrap();

    store.delete(second.id).await.unwrap();
    assert!(store.get(second.id).await.unwrap().is_none());

    // 0001 and 0003 remain: next is 0004, not count + 1
    let fourth = store.create(student("Four", &course)).await.unwrap();
    assert_eq!(fourth.student_id.to_string(), sid(&course, 4));
}

pub async fn course_change_cascades_to_grades<S: StudentStore + GradeStore>(store: &S) {
    let from = unique_course("A");
    let to = unique_course("B");
    let created = store.create(student("Mover", &from)).await.unwrap();
    let old_id = created.student_id.clone();

    for subject in ["Math", "Physics"] {
        store
            .record_grade(NewGrade::new(old_id.clone(), subject, 88.0).unwrap())
            .await
            .unwrap();
    }

    let update = StudentUpdate::from_record(&created).with_course(&to).unwrap();
    let updated = store.update(created.id, update).await.unwrap();

    assert_eq!(updated.student_id.to_string(), sid(&to, 1));
    assert_eq!(updated.course.as_str(), to.to_ascii_uppercase());

    let moved = store.grades_for(&updated.student_id).await.unwrap();
    assert_eq!(moved.len(), 2);
    assert!(moved.iter().all(|g| g.student_id == updated.student_id));
    assert!(store.grades_for(&old_id).await.unwrap().is_empty());
    assert!(store.find_by_student_id(&old_id).await.unwrap().is_none());
}

pub async fn update_without_course_change_keeps_id<S: StudentStore>(store: &S) {
    let course = unique_course("K");
    let created = store.create(student("Keeper", &course)).await.unwrap();

    let update = StudentUpdate::from_record(&created)
        .with_name("Keeper Renamed")
        .unwrap()
        .with_section("B")
        .unwrap()
        .with_year(2)
        .unwrap()
        // same course, different case
        .with_course(&course.to_ascii_lowercase())
        .unwrap();
    let updated = store.update(created.id, update).await.unwrap();

    assert_eq!(updated.student_id, created.student_id);
    assert_eq!(updated.name, "Keeper Renamed");
    assert_eq!(updated.year, 2);

    let stored = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(stored, updated);
}

pub async fn concurrent_creates_never_share_an_id<S>(store: Arc<S>)
where
    S: StudentStore + 'static,
{
    let course = unique_course("R");
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = Arc::clone(&store);
            let course = course.clone();
            tokio::spawn(async move {
                store
                    .create(student(&format!("Racer {i}"), &course))
                    .await
                    .map(|s| s.student_id.to_string())
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        let id = handle.await.expect("task panicked").expect("create failed");
        assert!(ids.insert(id.clone()), "duplicate id {id}");
    }

    let expected: HashSet<String> = (1..=16).map(|seq| sid(&course, seq)).collect();
    assert_eq!(ids, expected);
}

pub async fn delete_keeps_grades<S: StudentStore + GradeStore>(store: &S) {
    let course = unique_course("D");
    let created = store.create(student("Leaver", &course)).await.unwrap();
    store
        .record_grade(NewGrade::new(created.student_id.clone(), "History", 75.5).unwrap())
        .await
        .unwrap();

    store.delete(created.id).await.unwrap();
    // deleting twice is fine
    store.delete(created.id).await.unwrap();

    assert!(store
        .find_by_student_id(&created.student_id)
        .await
        .unwrap()
        .is_none());
    let retained = store.grades_for(&created.student_id).await.unwrap();
    assert_eq!(retained.len(), 1);
    assert_eq!(retained[0].subject, "History");
}

pub async fn lookups_report_absence<S: StudentStore>(store: &S) {
    let missing = StudentId::parse(&sid(&unique_course("N"), 1)).unwrap();
    assert!(store.find_by_student_id(&missing).await.unwrap().is_none());
    assert!(store.get(i64::MAX).await.unwrap().is_none());

    let update = StudentUpdate::new(missing, "Ghost", "BSIT", 1, "A").unwrap();
    let err = store.update(i64::MAX, update).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

pub async fn grade_for_unknown_student_is_not_found<S: GradeStore>(store: &S) {
    let missing = StudentId::parse(&sid(&unique_course("U"), 1)).unwrap();
    let err = store
        .record_grade(NewGrade::new(missing, "Math", 90.0).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { resource: "student", .. }));
}

pub async fn id_changes_only_with_course<S: StudentStore>(store: &S) {
    let course = unique_course("T");
    let other = unique_course("O");
    let first = store.create(student("First", &course)).await.unwrap();
    let second = store.create(student("Second", &course)).await.unwrap();

    // another student's id in the same bucket
    let update = StudentUpdate::new(first.student_id.clone(), "Second", &course, 1, "A").unwrap();
    let err = store.update(second.id, update).await.unwrap_err();
    assert!(matches!(err, DbError::Validation(_)), "{err}");

    // an unused id from a different bucket
    let foreign = StudentId::parse(&sid(&other, 9)).unwrap();
    let update = StudentUpdate::new(foreign, "Second", &course, 1, "A").unwrap();
    let err = store.update(second.id, update).await.unwrap_err();
    assert!(matches!(err, DbError::Validation(_)), "{err}");

    let stored = store.get(second.id).await.unwrap().unwrap();
    assert_eq!(stored, second);

    // the other bucket's sequence was not advanced
    let next = store
        .next_student_id(&CourseCode::new(&other).unwrap())
        .await
        .unwrap();
    assert_eq!(next.to_string(), sid(&other, 1));
}

pub async fn reissued_id_does_not_inherit_grades<S: StudentStore + GradeStore>(store: &S) {
    let course = unique_course("I");
    let alice = store.create(student("Alice", &course)).await.unwrap();
    store
        .record_grade(NewGrade::new(alice.student_id.clone(), "Math", 42.0).unwrap())
        .await
        .unwrap();
    store.delete(alice.id).await.unwrap();

    let bob = store.create(student("Bob", &course)).await.unwrap();
    assert_ne!(bob.student_id, alice.student_id);
    assert_eq!(bob.student_id.to_string(), sid(&course, 2));
    assert!(store.grades_for(&bob.student_id).await.unwrap().is_empty());

    // Alice's grade is still on record under her old id
    assert_eq!(store.grades_for(&alice.student_id).await.unwrap().len(), 1);
}

pub async fn get_all_lists_in_key_order<S: StudentStore>(store: &S) {
    let course = unique_course("L");
    let a = store.create(student("A", &course)).await.unwrap();
    let b = store.create(student("B", &course)).await.unwrap();

    let all = store.get_all().await.unwrap();
    let pos_a = all.iter().position(|s| s.id == a.id).unwrap();
    let pos_b = all.iter().position(|s| s.id == b.id).unwrap();
    assert!(pos_a < pos_b);
    assert!(all.windows(2).all(|w| w[0].id < w[1].id));
}
