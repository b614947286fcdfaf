//! Demo data for a fresh database.

use tracing::info;
use tutorlink_db::{
    CartRepository, DbError, NewTimeSlot, PersonRepository, Store, TimeSlotRepository,
};

const STUDENTS: [&str; 3] = [
    "student1@email.com",
    "student2@email.com",
    "student3@email.com",
];
const PROMOTED_STUDENT: &str = "student4butactuallyteacher@email.com";
const TEACHERS: [(&str, &str, &[&str]); 3] = [
    ("teacher1@email.com", "teacherOne", &["English"]),
    ("teacher2@email.com", "teacherTwo", &["English", "Math"]),
    ("teacher3@email.com", "teacherThree", &["Math"]),
];

#[derive(Debug, Clone, PartialEq)]
pub struct SeedReport {
    /// False when the demo teachers were already present and nothing was written.
    pub seeded: bool,
    pub time_slot_ids: Vec<i64>,
}

/// Start of the current hour, UTC unix seconds.
pub fn current_hour(now: i64) -> i64 {
    now - now.rem_euclid(3600)
}

/// Four students (the last one promoted to teacher), three teachers, one
/// slot each for the first two teachers at `start_time`, and both slots in
/// the first student's cart. Does nothing if the demo data already exists.
pub async fn populate_demo(store: &Store, start_time: i64) -> Result<SeedReport, DbError> {
    if store.persons.find_by_email(TEACHERS[0].0).await?.is_some() {
        info!("Demo data already present; skipping");
        return Ok(SeedReport {
            seeded: false,
            time_slot_ids: Vec::new(),
        });
    }

    for email in STUDENTS.iter().chain(std::iter::once(&PROMOTED_STUDENT)) {
        store.persons.add_student(email, local_part(email)).await?;
    }
    store.persons.make_teacher(PROMOTED_STUDENT, &[], "").await?;

    for (email, name, subjects) in TEACHERS {
        let subjects: Vec<String> = subjects.iter().map(|s| s.to_string()).collect();
        store.persons.add_teacher(email, name, &subjects, "").await?;
    }

    let mut time_slot_ids = Vec::new();
    for (email, _, _) in &TEACHERS[..2] {
        let slot = store
            .time_slots
            .add_time_slot(NewTimeSlot {
                teacher_email: email.to_string(),
                start_time,
                subject: None,
            })
            .await?;
        time_slot_ids.push(slot.id);
    }

    for id in &time_slot_ids {
        store.carts.append(STUDENTS[0], *id).await?;
    }

    info!(
        "Seeded {} people and time slots {:?}",
        STUDENTS.len() + 1 + TEACHERS.len(),
        time_slot_ids
    );
    Ok(SeedReport {
        seeded: true,
        time_slot_ids,
    })
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
