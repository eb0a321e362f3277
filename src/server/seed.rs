//! Demo data served by the mock data store on a fresh start.

use serde_json::{json, Value};

/// Demo accounts as (email, password, name, role, permissions).
pub const DEMO_ACCOUNTS: &[(&str, &str, &str, &str, &[&str])] = &[
    ("admin@school.pk", "admin123", "Admin User", "admin", &["read", "write", "delete", "manage_users"]),
    ("manager@school.pk", "manager123", "Manager User", "manager", &["read", "write"]),
    ("user@school.pk", "user123", "Regular User", "user", &["read"]),
    ("guest@school.pk", "guest123", "Guest User", "guest", &[]),
];

fn users() -> Vec<Value> {
    DEMO_ACCOUNTS
        .iter()
        .enumerate()
        .map(|(i, (email, password, name, role, perms))| {
            json!({ "id": i + 1, "email": email, "password": password, "name": name, "role": role, "permissions": perms })
        })
        .collect()
}

fn students() -> Vec<Value> {
    let rows = [
        ("Ahmed Ali", "Ali Khan", "10-A", "101", "0300-1234567", "Karachi", "2024-01-15", "paid"),
        ("Sara Khan", "Khan Sahib", "9-B", "205", "0301-2345678", "Lahore", "2024-02-20", "pending"),
        ("Fatima Noor", "Noor Ahmed", "10-A", "102", "0302-3456789", "Islamabad", "2024-01-10", "paid"),
        ("Hassan Raza", "Raza Ali", "8-C", "308", "0303-4567890", "Karachi", "2024-03-05", "pending"),
        ("Ayesha Malik", "Malik Sahib", "9-A", "201", "0304-5678901", "Lahore", "2024-02-15", "paid"),
    ];
    rows.iter()
        .enumerate()
        .map(|(i, (name, father, class, roll, phone, address, admitted, fee))| {
            json!({
                "id": i + 1, "name": name, "fatherName": father, "class": class, "rollNumber": roll,
                "phone": phone, "address": address, "admissionDate": admitted, "feeStatus": fee
            })
        })
        .collect()
}

fn teachers() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Imran Qureshi", "qualification": "M.Sc Mathematics", "subject": "Mathematics", "phone": "0311-1111111",
               "email": "imran@school.pk", "address": "Karachi", "joiningDate": "2019-08-01", "salary": 85000, "status": "active"}),
        json!({"id": 2, "name": "Nadia Hussain", "qualification": "M.A English", "subject": "English", "phone": "0312-2222222",
               "email": "nadia@school.pk", "address": "Lahore", "joiningDate": "2020-03-15", "salary": 78000, "status": "active"}),
        json!({"id": 3, "name": "Bilal Ahmed", "qualification": "M.Sc Physics", "subject": "Physics", "phone": "0313-3333333",
               "email": "bilal@school.pk", "address": "Islamabad", "joiningDate": "2018-01-10", "salary": 90000, "status": "inactive"}),
    ]
}

fn classes() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "10-A", "grade": "10", "section": "A", "classTeacher": "Imran Qureshi", "subject": "Mathematics",
               "room": "R-101", "totalStudents": 32, "schedule": "Mon-Fri 8:00-1:30", "status": "active"}),
        json!({"id": 2, "name": "9-B", "grade": "9", "section": "B", "classTeacher": "Nadia Hussain", "subject": "English",
               "room": "R-204", "totalStudents": 28, "schedule": "Mon-Fri 8:00-1:30", "status": "active"}),
        json!({"id": 3, "name": "8-C", "grade": "8", "section": "C", "classTeacher": "Bilal Ahmed", "subject": "Physics",
               "room": "R-305", "totalStudents": 30, "schedule": "Mon-Fri 8:00-1:00", "status": "active"}),
    ]
}

fn attendance() -> Vec<Value> {
    let rows = [
        ("2025-01-10", 1, "Ahmed Ali", "10-A", "present"),
        ("2025-01-10", 3, "Fatima Noor", "10-A", "late"),
        ("2025-01-10", 2, "Sara Khan", "9-B", "absent"),
        ("2025-01-10", 4, "Hassan Raza", "8-C", "present"),
    ];
    rows.iter()
        .enumerate()
        .map(|(i, (date, sid, name, class, status))| {
            json!({
                "id": i + 1, "date": date, "studentId": sid, "studentName": name, "class": class,
                "status": status, "markedBy": "Admin User", "remarks": ""
            })
        })
        .collect()
}

fn fees() -> Vec<Value> {
    let rows = [
        (1, "Ahmed Ali", "10-A", "101", 5000, 5000, 0, "2025-01-05", 5000, "paid"),
        (2, "Sara Khan", "9-B", "205", 4500, 0, 4500, "", 0, "pending"),
        (3, "Fatima Noor", "10-A", "102", 5000, 2500, 2500, "2025-01-03", 2500, "partial"),
        (4, "Hassan Raza", "8-C", "308", 4000, 0, 4000, "", 0, "pending"),
        (5, "Ayesha Malik", "9-A", "201", 4500, 4500, 0, "2025-01-02", 4500, "paid"),
    ];
    rows.iter()
        .map(|(sid, name, class, roll, monthly, paid, pending, last_date, last_amount, status)| {
            json!({
                "id": sid, "studentId": sid, "studentName": name, "class": class, "rollNumber": roll,
                "monthlyFee": monthly, "totalPaid": paid, "totalPending": pending,
                "lastPaymentDate": last_date, "lastPaymentAmount": last_amount, "status": status, "dueDate": "2025-01-31"
            })
        })
        .collect()
}

fn profiles() -> Vec<Value> {
    (1..=6)
        .map(|i| {
            let description = if i == 6 { "abc" } else { "xyz" };
            json!({ "id": i, "profileName": format!("Profile-{}", i), "description": description, "creationDate": format!("{}-08-2025", 19 + i) })
        })
        .collect()
}

pub fn demo_collections() -> Vec<(&'static str, Vec<Value>)> {
    vec![
        ("users", users()),
        ("students", students()),
        ("teachers", teachers()),
        ("classes", classes()),
        ("attendance", attendance()),
        ("fees", fees()),
        ("profiles", profiles()),
    ]
}
