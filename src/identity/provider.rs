use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::pipeline::{ApiRequest, Pipeline};
use crate::tprintln;

use super::principal::{IdentityRecord, Permission, Role};

pub const USERS_COLLECTION: &str = "users";

/// A new account as submitted from the signup screen (already validated).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignupRequest {
    /// Self-registered accounts start as plain users with read/write grants.
    pub fn to_record_json(&self) -> serde_json::Value {
        json!({
            "email": self.email,
            "password": self.password,
            "name": self.name,
            "role": Role::User.as_str(),
            "permissions": [Permission::Read.as_str(), Permission::Write.as_str()],
        })
    }
}

/// The remote identity collection, treated as a black box.
pub trait IdentityProvider: Send + Sync {
    /// Zero-or-one record whose email and credential both match.
    fn find_by_credentials<'a>(&'a self, email: &'a str, credential: &'a str) -> BoxFuture<'a, AppResult<Option<IdentityRecord>>>;

    fn register<'a>(&'a self, req: &'a SignupRequest) -> BoxFuture<'a, AppResult<IdentityRecord>>;

    /// Whole-record replace of the stored account, keeping fields this console does not model.
    fn update_record<'a>(&'a self, id: u64, changes: serde_json::Value) -> BoxFuture<'a, AppResult<IdentityRecord>>;
}

/// Identity provider backed by the `users` collection, reached through the request pipeline.
pub struct RemoteIdentityProvider {
    pipeline: Arc<Pipeline>,
}

impl RemoteIdentityProvider {
    pub fn new(pipeline: Arc<Pipeline>) -> Self { Self { pipeline } }
}

impl IdentityProvider for RemoteIdentityProvider {
    fn find_by_credentials<'a>(&'a self, email: &'a str, credential: &'a str) -> BoxFuture<'a, AppResult<Option<IdentityRecord>>> {
        async move {
            let req = ApiRequest::get(USERS_COLLECTION).query("email", email).query("password", credential);
            let found: Vec<IdentityRecord> = self.pipeline.send(req).await?.json()?;
            tprintln!("identity.lookup email={} matches={}", email, found.len());
            Ok(found.into_iter().find(|r| r.email == email))
        }
        .boxed()
    }

    fn register<'a>(&'a self, req: &'a SignupRequest) -> BoxFuture<'a, AppResult<IdentityRecord>> {
        async move {
            let existing: Vec<IdentityRecord> = self
                .pipeline
                .send(ApiRequest::get(USERS_COLLECTION).query("email", &req.email))
                .await?
                .json()?;
            if !existing.is_empty() {
                return Err(AppError::conflict("email_taken", "Sign up failed. Email might already exist."));
            }
            let created: IdentityRecord = self
                .pipeline
                .send(ApiRequest::post(USERS_COLLECTION, req.to_record_json()))
                .await?
                .json()?;
            Ok(created)
        }
        .boxed()
    }

    fn update_record<'a>(&'a self, id: u64, changes: serde_json::Value) -> BoxFuture<'a, AppResult<IdentityRecord>> {
        async move {
            let path = format!("{}/{}", USERS_COLLECTION, id);
            let mut current: serde_json::Value = self.pipeline.send(ApiRequest::get(&path)).await?.json()?;
            merge_fields(&mut current, changes)?;
            let updated: IdentityRecord = self.pipeline.send(ApiRequest::put(&path, current)).await?.json()?;
            Ok(updated)
        }
        .boxed()
    }
}

fn merge_fields(target: &mut serde_json::Value, changes: serde_json::Value) -> AppResult<()> {
    let (Some(dst), serde_json::Value::Object(src)) = (target.as_object_mut(), changes) else {
        return Err(AppError::internal("bad_record", "account record is not a JSON object"));
    };
    for (k, v) in src {
        if k != "id" { dst.insert(k, v); }
    }
    Ok(())
}

/// In-process provider over a fixed account list. Plaintext credentials; a mock-backend stand-in only.
pub struct StaticIdentityProvider {
    accounts: RwLock<Vec<(IdentityRecord, String)>>,
}

impl StaticIdentityProvider {
    pub fn new(accounts: Vec<(IdentityRecord, String)>) -> Self { Self { accounts: RwLock::new(accounts) } }
}

impl IdentityProvider for StaticIdentityProvider {
    fn find_by_credentials<'a>(&'a self, email: &'a str, credential: &'a str) -> BoxFuture<'a, AppResult<Option<IdentityRecord>>> {
        let found = self
            .accounts
            .read()
            .iter()
            .find(|(rec, pw)| rec.email == email && pw == credential)
            .map(|(rec, _)| rec.clone());
        async move { Ok(found) }.boxed()
    }

    fn register<'a>(&'a self, req: &'a SignupRequest) -> BoxFuture<'a, AppResult<IdentityRecord>> {
        let result = {
            let mut accounts = self.accounts.write();
            if accounts.iter().any(|(r, _)| r.email == req.email) {
                Err(AppError::conflict("email_taken", "Sign up failed. Email might already exist."))
            } else {
                let id = accounts.iter().map(|(r, _)| r.id).max().unwrap_or(0) + 1;
                let rec = IdentityRecord {
                    id,
                    email: req.email.clone(),
                    name: req.name.clone(),
                    role: Role::User,
                    permissions: [Permission::Read, Permission::Write].into_iter().collect(),
                };
                accounts.push((rec.clone(), req.password.clone()));
                Ok(rec)
            }
        };
        async move { result }.boxed()
    }

    fn update_record<'a>(&'a self, id: u64, changes: serde_json::Value) -> BoxFuture<'a, AppResult<IdentityRecord>> {
        let result = {
            let mut accounts = self.accounts.write();
            match accounts.iter_mut().find(|(r, _)| r.id == id) {
                None => Err(AppError::not_found("not_found", "account not found")),
                Some((rec, pw)) => {
                    if let Some(p) = changes.get("password").and_then(|v| v.as_str()) { *pw = p.to_string(); }
                    if let Some(n) = changes.get("name").and_then(|v| v.as_str()) { rec.name = n.to_string(); }
                    if let Some(e) = changes.get("email").and_then(|v| v.as_str()) { rec.email = e.to_string(); }
                    Ok(rec.clone())
                }
            }
        };
        async move { result }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> StaticIdentityProvider {
        StaticIdentityProvider::new(vec![(
            IdentityRecord { id: 4, email: "guest@school.pk".into(), name: "Guest".into(), role: Role::Guest, permissions: Default::default() },
            "guest123".into(),
        )])
    }

    #[tokio::test]
    async fn static_lookup_requires_both_fields() {
        let p = accounts();
        assert!(p.find_by_credentials("guest@school.pk", "guest123").await.unwrap().is_some());
        assert!(p.find_by_credentials("guest@school.pk", "nope").await.unwrap().is_none());
        assert!(p.find_by_credentials("other@school.pk", "guest123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn static_register_rejects_duplicates() {
        let p = accounts();
        let req = SignupRequest { name: "New Person".into(), email: "new@school.pk".into(), password: "secret1".into() };
        let rec = p.register(&req).await.unwrap();
        assert_eq!(rec.id, 5);
        assert_eq!(rec.role, Role::User);
        assert!(rec.permissions.contains(&Permission::Write));
        assert!(matches!(p.register(&req).await, Err(AppError::Conflict { .. })));
        p.update_record(5, json!({"password": "changed"})).await.unwrap();
        assert!(p.find_by_credentials("new@school.pk", "changed").await.unwrap().is_some());
    }

    #[test]
    fn merge_keeps_id_and_unknown_fields() {
        let mut cur = json!({"id": 2, "email": "a@b.co", "password": "x", "phone": "123"});
        merge_fields(&mut cur, json!({"id": 99, "password": "y"})).unwrap();
        assert_eq!(cur["id"], 2);
        assert_eq!(cur["password"], "y");
        assert_eq!(cur["phone"], "123");
    }
}
