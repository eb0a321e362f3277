use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    Paid,
    #[default]
    Pending,
    Partial,
}

impl FeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeStatus::Paid => "paid",
            FeeStatus::Pending => "pending",
            FeeStatus::Partial => "partial",
        }
    }

    pub fn parse(s: &str) -> Option<FeeStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paid" => Some(FeeStatus::Paid),
            "pending" => Some(FeeStatus::Pending),
            "partial" => Some(FeeStatus::Partial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Student {
    pub id: u64,
    pub name: String,
    pub father_name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub roll_number: String,
    pub phone: String,
    pub address: String,
    pub admission_date: String,
    pub fee_status: FeeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Teacher {
    pub id: u64,
    pub name: String,
    pub qualification: String,
    pub subject: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub joining_date: String,
    pub salary: f64,
    pub status: ActiveStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SchoolClass {
    pub id: u64,
    pub name: String,
    pub grade: String,
    pub section: String,
    pub class_teacher: String,
    pub subject: String,
    pub room: String,
    pub total_students: u32,
    pub schedule: String,
    pub status: ActiveStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendanceRecord {
    pub id: u64,
    /// `YYYY-MM-DD`
    pub date: String,
    pub student_id: u64,
    pub student_name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub status: AttendanceStatus,
    pub marked_by: String,
    pub remarks: String,
}

/// Amounts are whole rupees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeRecord {
    pub id: u64,
    pub student_id: u64,
    pub student_name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub roll_number: String,
    pub monthly_fee: u64,
    pub total_paid: u64,
    pub total_pending: u64,
    pub last_payment_date: String,
    pub last_payment_amount: u64,
    pub status: FeeStatus,
    pub due_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: u64,
    pub profile_name: String,
    pub description: String,
    pub creation_date: String,
}
