//!
//! collections
//! -----------
//! Thin CRUD facades over the remote collections. Each record type names its
//! collection path; every call goes through the shared request pipeline so it
//! is counted for loading, annotated with identity and classified on failure.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::identity::Action;
use crate::pipeline::Pipeline;

mod filters;
mod latest;
mod records;
mod stats;

pub use filters::{filter_attendance, filter_fees, filter_profiles, filter_students, filter_teachers, matches_query};
pub use latest::{LatestSearch, SearchTicket};
pub use records::{
    ActiveStatus, AttendanceRecord, AttendanceStatus, FeeRecord, FeeStatus, SchoolClass, Student, Teacher, UserProfile,
};
pub use stats::{apply_payment, attendance_stats, fee_summary, AttendanceStats, FeeSummary};

/// A record stored in a remote collection under a server-assigned integer id.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection path segment, e.g. `students`.
    const COLLECTION: &'static str;
    /// Singular display noun, e.g. `Student`.
    const NOUN: &'static str;
    const ADD_ACTION: Action = Action::Add;
    const EDIT_ACTION: Action = Action::Edit;
    const DELETE_ACTION: Action = Action::Delete;

    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
    /// Human label used in notifications.
    fn label(&self) -> String;
}

macro_rules! record {
    ($t:ty, $collection:literal, $noun:literal, |$r:ident| $label:expr $(, $gate:ident = $action:expr)*) => {
        impl Record for $t {
            const COLLECTION: &'static str = $collection;
            const NOUN: &'static str = $noun;
            $(const $gate: Action = $action;)*
            fn id(&self) -> u64 { self.id }
            fn set_id(&mut self, id: u64) { self.id = id; }
            fn label(&self) -> String {
                let $r = self;
                $label
            }
        }
    };
}

record!(Student, "students", "Student", |r| r.name.clone());
record!(Teacher, "teachers", "Teacher", |r| r.name.clone());
record!(SchoolClass, "classes", "Class", |r| r.name.clone());
record!(AttendanceRecord, "attendance", "Attendance", |r| format!("{} ({})", r.student_name, r.date));
record!(FeeRecord, "fees", "Fee Record", |r| r.student_name.clone());
record!(UserProfile, "profiles", "Profile", |r| r.profile_name.clone(),
    ADD_ACTION = Action::WriteProfile,
    EDIT_ACTION = Action::WriteProfile,
    DELETE_ACTION = Action::DeleteProfile);

pub struct Collection<T: Record> {
    pipeline: Arc<Pipeline>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for Collection<T> {
    fn clone(&self) -> Self { Self { pipeline: self.pipeline.clone(), _record: PhantomData } }
}

impl<T: Record> Collection<T> {
    pub fn new(pipeline: Arc<Pipeline>) -> Self { Self { pipeline, _record: PhantomData } }

    fn item_path(id: u64) -> String { format!("{}/{}", T::COLLECTION, id) }

    pub async fn get_all(&self) -> AppResult<Vec<T>> { self.pipeline.get_json(T::COLLECTION).await }

    pub async fn get_by_id(&self, id: u64) -> AppResult<T> { self.pipeline.get_json(&Self::item_path(id)).await }

    /// The server assigns the id; whatever id `record` carries is not sent.
    pub async fn create(&self, record: &T) -> AppResult<T> {
        let mut body = serde_json::to_value(record)?;
        match body.as_object_mut() {
            Some(obj) => {
                obj.remove("id");
            }
            None => return Err(AppError::internal("bad_record", "record does not serialize to a JSON object")),
        }
        self.pipeline.post_json(T::COLLECTION, &body).await
    }

    /// Whole-record replace by id.
    pub async fn update(&self, record: &T) -> AppResult<T> {
        if record.id() == 0 {
            return Err(AppError::user("missing_id", "cannot update a record that has no id"));
        }
        self.pipeline.put_json(&Self::item_path(record.id()), record).await
    }

    pub async fn delete(&self, id: u64) -> AppResult<()> { self.pipeline.delete(&Self::item_path(id)).await }
}
