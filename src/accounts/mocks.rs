//! In-memory stand-ins for the store, notifier and clock.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::Barrier;
use uuid::Uuid;

use crate::accounts::{
    repo::UserStore,
    repo_types::{NewUser, User},
    tokens::Clock,
};
use crate::notify::{Mail, Notifier};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
    reset_lookup_gate: Mutex<Option<Arc<Barrier>>>,
    fail_next: AtomicBool,
}

impl MemoryUserStore {
    pub fn get(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    /// Holds reset-token lookups until `n` of them are waiting.
    pub fn pause_reset_lookups(&self, n: usize) {
        *self.reset_lookup_gate.lock().unwrap() = Some(Arc::new(Barrier::new(n)));
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self) -> anyhow::Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            anyhow::bail!("store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.check_failure()?;
        Ok(self.get(email))
    }

    async fn find_by_reset_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        self.check_failure()?;
        let found = self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.reset_token.as_deref() == Some(token))
            .min_by_key(|u| u.created_at)
            .cloned();
        let gate = self.reset_lookup_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        Ok(found)
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<Option<Uuid>> {
        self.check_failure()?;
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Ok(None);
        }
        let id = user.id;
        users.insert(
            id,
            User {
                id,
                email: user.email,
                password_hash: user.password_hash,
                verified: false,
                verification_token: Some(user.verification_token),
                verification_expiration: Some(user.verification_expiration),
                reset_token: None,
                reset_expiration: None,
                created_at: user.created_at,
            },
        );
        Ok(Some(id))
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        self.check_failure()?;
        let mut users = self.users.lock().unwrap();
        Ok(match users.get_mut(&id) {
            Some(u) => {
                u.reset_token = Some(token.to_string());
                u.reset_expiration = Some(expires_at);
                true
            }
            None => false,
        })
    }

    async fn consume_verification(&self, id: Uuid, token: &str) -> anyhow::Result<bool> {
        self.check_failure()?;
        let mut users = self.users.lock().unwrap();
        Ok(match users.get_mut(&id) {
            Some(u) if u.verification_token.as_deref() == Some(token) => {
                u.verified = true;
                u.verification_token = None;
                u.verification_expiration = None;
                true
            }
            _ => false,
        })
    }

    async fn consume_reset(
        &self,
        id: Uuid,
        token: &str,
        password_hash: &str,
    ) -> anyhow::Result<bool> {
        self.check_failure()?;
        let mut users = self.users.lock().unwrap();
        Ok(match users.get_mut(&id) {
            Some(u) if u.reset_token.as_deref() == Some(token) => {
                u.password_hash = password_hash.to_string();
                u.reset_token = None;
                u.reset_expiration = None;
                true
            }
            _ => false,
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Mail>>,
    should_fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            should_fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, mail: &Mail) -> anyhow::Result<()> {
        if self.should_fail {
            anyhow::bail!("smtp unavailable");
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap()
    }
}
