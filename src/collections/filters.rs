//! List-screen filters. Text matching is a case-insensitive substring test over
//! a fixed set of fields per record; a blank query matches everything.

use super::records::{AttendanceRecord, FeeRecord, FeeStatus, Student, Teacher, UserProfile};

pub fn matches_query(query: &str, fields: &[&str]) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    fields.iter().any(|f| f.to_lowercase().contains(&q))
}

pub fn filter_students<'a>(students: &'a [Student], query: &str) -> Vec<&'a Student> {
    students
        .iter()
        .filter(|s| matches_query(query, &[s.name.as_str(), s.roll_number.as_str(), s.class_name.as_str()]))
        .collect()
}

pub fn filter_teachers<'a>(teachers: &'a [Teacher], query: &str) -> Vec<&'a Teacher> {
    teachers
        .iter()
        .filter(|t| matches_query(query, &[t.name.as_str(), t.subject.as_str(), t.email.as_str()]))
        .collect()
}

/// `status` of `None` means all statuses.
pub fn filter_fees<'a>(records: &'a [FeeRecord], status: Option<FeeStatus>, query: &str) -> Vec<&'a FeeRecord> {
    records
        .iter()
        .filter(|r| status.map_or(true, |s| r.status == s))
        .filter(|r| matches_query(query, &[r.student_name.as_str(), r.roll_number.as_str(), r.class_name.as_str()]))
        .collect()
}

/// Records for one date, optionally narrowed to a class, then by student name.
pub fn filter_attendance<'a>(
    records: &'a [AttendanceRecord],
    date: &str,
    class_name: Option<&str>,
    query: &str,
) -> Vec<&'a AttendanceRecord> {
    records
        .iter()
        .filter(|r| r.date == date)
        .filter(|r| class_name.map_or(true, |c| r.class_name == c))
        .filter(|r| matches_query(query, &[r.student_name.as_str()]))
        .collect()
}

pub fn filter_profiles<'a>(profiles: &'a [UserProfile], query: &str) -> Vec<&'a UserProfile> {
    profiles.iter().filter(|p| matches_query(query, &[p.profile_name.as_str()])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::AttendanceStatus;

    fn student(id: u64, name: &str, class: &str, roll: &str) -> Student {
        Student { id, name: name.into(), class_name: class.into(), roll_number: roll.into(), ..Default::default() }
    }

    #[test]
    fn student_search_covers_name_roll_and_class() {
        let all = vec![student(1, "Ahmed Ali", "10-A", "101"), student(2, "Sara Khan", "9-B", "205")];
        assert_eq!(filter_students(&all, "  ").len(), 2);
        assert_eq!(filter_students(&all, "sara")[0].id, 2);
        assert_eq!(filter_students(&all, "10-a")[0].id, 1);
        assert_eq!(filter_students(&all, "205")[0].id, 2);
        assert!(filter_students(&all, "zzz").is_empty());
    }

    #[test]
    fn fees_filter_by_status_then_text() {
        let mk = |id, name: &str, status| FeeRecord { id, student_name: name.into(), status, ..Default::default() };
        let all = vec![mk(1, "Ahmed Ali", FeeStatus::Paid), mk(2, "Sara Khan", FeeStatus::Pending), mk(3, "Ali Raza", FeeStatus::Pending)];
        assert_eq!(filter_fees(&all, Some(FeeStatus::Pending), "").len(), 2);
        let hits = filter_fees(&all, Some(FeeStatus::Pending), "ali");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 3);
        assert_eq!(filter_fees(&all, None, "ali").len(), 2);
    }

    #[test]
    fn attendance_is_scoped_to_date_and_class() {
        let mk = |id, date: &str, class: &str, name: &str| AttendanceRecord {
            id,
            date: date.into(),
            class_name: class.into(),
            student_name: name.into(),
            status: AttendanceStatus::Present,
            ..Default::default()
        };
        let all = vec![
            mk(1, "2025-01-10", "10-A", "Ahmed Ali"),
            mk(2, "2025-01-10", "9-B", "Sara Khan"),
            mk(3, "2025-01-11", "10-A", "Ahmed Ali"),
        ];
        assert_eq!(filter_attendance(&all, "2025-01-10", None, "").len(), 2);
        assert_eq!(filter_attendance(&all, "2025-01-10", Some("10-A"), "").len(), 1);
        assert!(filter_attendance(&all, "2025-01-10", Some("10-A"), "sara").is_empty());
    }
}
