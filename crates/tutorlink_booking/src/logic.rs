// --- File: crates/tutorlink_booking/src/logic.rs ---
use serde::Deserialize;
use tracing::{debug, info, warn};
use tutorlink_db::{
    Cart, CartRepository, DbError, NewTimeSlot, Person, PersonRepository, Store, TimeSlot,
    TimeSlotQuery, TimeSlotRepository,
};

use crate::error::BookingError;

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

// --- Data Structures ---
//
// Every field arrives as text (query string or urlencoded body) and is parsed
// here, so a malformed number becomes a 400 with a JSON body instead of an
// extractor rejection.

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema, IntoParams))]
pub struct RegisterRequest {
    /// Display name. Defaults to the provider's name, then the local part of the email.
    #[cfg_attr(feature = "openapi", schema(example = "Ada"))]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema, IntoParams))]
pub struct SearchTimesRequest {
    pub teacher_email: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "Math"))]
    pub subject: Option<String>,
    /// Unix seconds, inclusive.
    pub min_start_time: Option<String>,
    /// Unix seconds, inclusive.
    pub max_start_time: Option<String>,
    /// `true` (default) or `false`.
    pub must_be_unclaimed: Option<String>,
    /// Client timezone offset in minutes. Accepted and ignored; times are UTC.
    pub tz_offset: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema, IntoParams))]
pub struct UpdateTimeRequest {
    /// Slot to change. Omit to create a new slot.
    pub id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "1767261600"))]
    pub start_time: Option<String>,
    pub subject: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema, IntoParams))]
pub struct TimeSlotIdRequest {
    #[cfg_attr(feature = "openapi", schema(example = "1"))]
    pub id: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema, IntoParams))]
pub struct MakeTeacherRequest {
    /// Comma separated.
    #[cfg_attr(feature = "openapi", schema(example = "English,Math"))]
    pub subjects: Option<String>,
    pub bio: Option<String>,
}

// --- Field parsing ---

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_int(field: &'static str, value: Option<String>) -> Result<Option<i64>, BookingError> {
    present(value)
        .map(|v| {
            v.parse::<i64>().map_err(|e| BookingError::InvalidField {
                field,
                message: e.to_string(),
            })
        })
        .transpose()
}

fn require_int(field: &'static str, value: Option<String>) -> Result<i64, BookingError> {
    parse_int(field, value)?.ok_or(BookingError::MissingField(field))
}

fn parse_flag(
    field: &'static str,
    value: Option<String>,
    default: bool,
) -> Result<bool, BookingError> {
    match present(value).map(|v| v.to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(other) => Err(BookingError::InvalidField {
            field,
            message: format!("'{}' is not a boolean", other),
        }),
    }
}

fn parse_subjects(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Maps the repository's generic slot errors onto the slot being acted on.
fn slot_error(id: i64) -> impl Fn(DbError) -> BookingError {
    move |e| match e {
        DbError::NotFound(_) => BookingError::SlotNotFound(id),
        DbError::Conflict(_) => BookingError::AlreadyClaimed(id),
        other => BookingError::Db(other),
    }
}

// --- Operations ---

/// Name precedence: the submitted form, the identity provider's display
/// name, then the local part of the email.
pub async fn register(
    store: &Store,
    email: &str,
    provider_name: Option<&str>,
    request: RegisterRequest,
) -> Result<Person, BookingError> {
    let name = present(request.name)
        .or_else(|| present(provider_name.map(str::to_string)))
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string());
    let person = store.persons.add_student(email, &name).await?;
    info!("Registered student {}", email);
    Ok(person)
}

pub async fn get_person(store: &Store, email: &str) -> Result<Person, BookingError> {
    store
        .persons
        .find_by_email(email)
        .await?
        .ok_or_else(|| BookingError::NotRegistered(email.to_string()))
}

pub async fn list_teachers(store: &Store) -> Result<Vec<Person>, BookingError> {
    Ok(store.persons.list_teachers().await?)
}

pub async fn search_times(
    store: &Store,
    request: SearchTimesRequest,
) -> Result<Vec<TimeSlot>, BookingError> {
    if let Some(offset) = present(request.tz_offset) {
        debug!("Ignoring tz_offset {}; times are UTC", offset);
    }

    let query = TimeSlotQuery {
        teacher_email: present(request.teacher_email),
        subject: present(request.subject),
        min_start_time: parse_int("min_start_time", request.min_start_time)?,
        max_start_time: parse_int("max_start_time", request.max_start_time)?,
        must_be_unclaimed: parse_flag("must_be_unclaimed", request.must_be_unclaimed, true)?,
    };
    Ok(store.time_slots.search(&query).await?)
}

/// Creates a slot for the calling teacher, or changes one they own that is
/// still unclaimed.
pub async fn update_time(
    store: &Store,
    email: &str,
    request: UpdateTimeRequest,
) -> Result<TimeSlot, BookingError> {
    let caller = store.persons.find_by_email(email).await?;
    if !caller.as_ref().is_some_and(Person::is_teacher) {
        warn!("{} tried to offer a time slot without being a teacher", email);
        return Err(BookingError::NotTeacher);
    }

    let start_time = parse_int("start_time", request.start_time)?;
    let subject = present(request.subject);

    let Some(id) = parse_int("id", request.id)? else {
        let start_time = start_time.ok_or(BookingError::MissingField("start_time"))?;
        let slot = store
            .time_slots
            .add_time_slot(NewTimeSlot {
                teacher_email: email.to_string(),
                start_time,
                subject,
            })
            .await?;
        info!("{} offered time slot {}", email, slot.id);
        return Ok(slot);
    };

    let existing = store
        .time_slots
        .find_by_id(id)
        .await?
        .ok_or(BookingError::SlotNotFound(id))?;
    if existing.teacher_email != email {
        return Err(BookingError::NotOwner(id));
    }
    if existing.is_claimed() {
        return Err(BookingError::AlreadyClaimed(id));
    }

    store
        .time_slots
        .update_time_slot(id, email, start_time, subject)
        .await
        .map_err(slot_error(id))
}

pub async fn add_to_cart(
    store: &Store,
    email: &str,
    request: TimeSlotIdRequest,
) -> Result<Cart, BookingError> {
    let id = require_int("id", request.id)?;
    let slot = store
        .time_slots
        .find_by_id(id)
        .await?
        .ok_or(BookingError::SlotNotFound(id))?;
    if slot.is_claimed() {
        return Err(BookingError::AlreadyClaimed(id));
    }

    // A frozen cart surfaces as the repository's own conflict message.
    let cart = store.carts.append(email, id).await?;
    info!("{} has {} slot(s) in cart", email, cart.len());
    Ok(cart)
}

pub async fn view_cart(store: &Store, email: &str) -> Result<Cart, BookingError> {
    Ok(store.carts.get_cart(email).await?)
}

pub async fn make_teacher(
    store: &Store,
    email: &str,
    request: MakeTeacherRequest,
) -> Result<Person, BookingError> {
    let subjects = parse_subjects(request.subjects);
    let bio = request.bio.unwrap_or_default();
    store
        .persons
        .make_teacher(email, &subjects, bio.trim())
        .await
        .map_err(|e| match e {
            DbError::NotFound(_) => BookingError::NotRegistered(email.to_string()),
            other => BookingError::Db(other),
        })
}

pub async fn claim_time(
    store: &Store,
    email: &str,
    request: TimeSlotIdRequest,
) -> Result<TimeSlot, BookingError> {
    let id = require_int("id", request.id)?;
    store
        .time_slots
        .claim(id, email)
        .await
        .map_err(slot_error(id))
}
