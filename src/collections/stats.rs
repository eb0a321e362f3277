use serde::Serialize;

use crate::error::{AppError, AppResult};

use super::records::{AttendanceRecord, AttendanceStatus, FeeRecord, FeeStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeeSummary {
    pub total_collected: u64,
    pub total_pending: u64,
    pub total_students: usize,
    /// Collected share of all fees, rounded to the nearest whole percent.
    pub collection_percentage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub attendance_percentage: u32,
}

fn rounded_percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

pub fn fee_summary(records: &[FeeRecord]) -> FeeSummary {
    let total_collected: u64 = records.iter().map(|r| r.total_paid).sum();
    let total_pending: u64 = records.iter().map(|r| r.total_pending).sum();
    FeeSummary {
        total_collected,
        total_pending,
        total_students: records.len(),
        collection_percentage: rounded_percent(total_collected, total_collected + total_pending),
    }
}

pub fn attendance_stats<'a, I: IntoIterator<Item = &'a AttendanceRecord>>(records: I) -> AttendanceStats {
    let mut s = AttendanceStats::default();
    for r in records {
        match r.status {
            AttendanceStatus::Present => s.present += 1,
            AttendanceStatus::Absent => s.absent += 1,
            AttendanceStatus::Late => s.late += 1,
        }
    }
    let total = (s.present + s.absent + s.late) as u64;
    s.attendance_percentage = rounded_percent(s.present as u64, total);
    s
}

/// The record after collecting `amount` on `date`. Amount must be positive and no more than what is pending.
pub fn apply_payment(record: &FeeRecord, amount: u64, date: &str) -> AppResult<FeeRecord> {
    if amount == 0 {
        return Err(AppError::user("invalid_amount", "Please enter a valid payment amount"));
    }
    if amount > record.total_pending {
        return Err(AppError::user("amount_exceeds_pending", "Payment amount cannot exceed pending amount"));
    }
    let total_pending = record.total_pending - amount;
    let status = if total_pending == 0 { FeeStatus::Paid } else { FeeStatus::Partial };
    Ok(FeeRecord {
        total_paid: record.total_paid + amount,
        total_pending,
        last_payment_date: date.to_string(),
        last_payment_amount: amount,
        status,
        ..record.clone()
    })
}
