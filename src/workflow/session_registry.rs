//! 会话登记表
//!
//! 以随机 token 区分参与者的问卷会话，token 作为隐藏字段随表单提交

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::{Catalog, ResponseDraft};
use crate::workflow::form_session::FormSession;

struct Entry {
    touched: Instant,
    session: FormSession,
}

#[derive(Default)]
struct Sessions {
    active: HashMap<Uuid, Entry>,
    /// 已提交的 token，不随空闲清理而删除
    submitted: HashSet<Uuid>,
}

pub struct SessionRegistry {
    ttl: Duration,
    sessions: Mutex<Sessions>,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(Sessions::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        // 会话数据只是作答草稿，锁中毒时继续使用
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// 为参与者开启新会话，返回 token 和初始作答
    pub fn open(&self, catalog: &Catalog, participant: &str) -> (Uuid, ResponseDraft) {
        let mut session = FormSession::new(catalog);
        session.enter_participant(participant, catalog);
        let draft = session.draft().clone();

        let token = Uuid::new_v4();
        let mut sessions = self.lock();
        self.prune(&mut sessions.active);
        sessions.active.insert(
            token,
            Entry {
                touched: Instant::now(),
                session,
            },
        );
        (token, draft)
    }

    /// 在 token 对应的会话上执行操作
    ///
    /// token 已经提交过时返回 `AlreadySubmitted`，不论会话是否已过期；
    /// token 缺失、未知或已过期时开启一个新会话，返回实际使用的 token
    pub fn with_session_or_open<R>(
        &self,
        token: Option<Uuid>,
        catalog: &Catalog,
        f: impl FnOnce(&mut FormSession) -> R,
    ) -> (Uuid, Result<R, ValidationError>) {
        let mut guard = self.lock();
        let sessions = &mut *guard;
        self.prune(&mut sessions.active);

        if let Some(t) = token.filter(|t| sessions.submitted.contains(t)) {
            return (t, Err(ValidationError::AlreadySubmitted));
        }

        let token = token
            .filter(|t| sessions.active.contains_key(t))
            .unwrap_or_else(Uuid::new_v4);
        let entry = sessions.active.entry(token).or_insert_with(|| {
            debug!("会话不存在或已过期，开启新会话");
            Entry {
                touched: Instant::now(),
                session: FormSession::new(catalog),
            }
        });
        entry.touched = Instant::now();
        let result = f(&mut entry.session);

        if entry.session.is_submitted() {
            sessions.active.remove(&token);
            sessions.submitted.insert(token);
        }
        (token, Ok(result))
    }

    /// 未提交的活跃会话数
    pub fn len(&self) -> usize {
        self.lock().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&self, active: &mut HashMap<Uuid, Entry>) {
        let before = active.len();
        active.retain(|_, entry| entry.touched.elapsed() <= self.ttl);
        let removed = before - active.len();
        if removed > 0 {
            debug!("清理了 {} 个过期会话", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionImage;
    use crate::workflow::form_session::FormState;

    fn catalog() -> Catalog {
        Catalog::from_sorted(vec![QuestionImage::new("Q01", "Q01_a.png", "images/Q01_a.png")])
    }

    #[test]
    fn test_open_and_reuse_session() {
        let catalog = catalog();
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let (token, draft) = registry.open(&catalog, "amy");
        assert_eq!(draft.participant(), "amy");

        let (used, state) =
            registry.with_session_or_open(Some(token), &catalog, |s| s.state().clone());
        assert_eq!(used, token);
        assert_eq!(state.unwrap(), FormState::Answering);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_token_opens_new_session() {
        let catalog = catalog();
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let stale = Uuid::new_v4();

        let (used, state) =
            registry.with_session_or_open(Some(stale), &catalog, |s| s.state().clone());
        assert_ne!(used, stale);
        assert_eq!(state.unwrap(), FormState::Empty);

        let (none_used, _) = registry.with_session_or_open(None, &catalog, |_| ());
        assert_ne!(none_used, used);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_sessions_are_independent() {
        let catalog = catalog();
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let (a, _) = registry.open(&catalog, "amy");
        let (b, _) = registry.open(&catalog, "bob");
        assert_ne!(a, b);

        let (_, recorded) =
            registry.with_session_or_open(Some(a), &catalog, |s| s.record("Q01", Some("Left")));
        assert!(recorded.unwrap().is_ok());
        let (_, b_answered) =
            registry.with_session_or_open(Some(b), &catalog, |s| s.draft().answered_count());
        assert_eq!(b_answered.unwrap(), 0);
    }

    #[test]
    fn test_expired_session_is_replaced() {
        let catalog = catalog();
        let registry = SessionRegistry::new(Duration::ZERO);
        let (token, _) = registry.open(&catalog, "amy");
        std::thread::sleep(Duration::from_millis(5));

        let (used, participant) = registry.with_session_or_open(Some(token), &catalog, |s| {
            s.draft().participant().to_string()
        });
        assert_ne!(used, token);
        assert_eq!(participant.unwrap(), "");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_submitted_token_refused_after_expiry() {
        let catalog = catalog();
        let registry = SessionRegistry::new(Duration::from_millis(20));
        let (token, _) = registry.open(&catalog, "amy");

        let (used, submitted) = registry.with_session_or_open(Some(token), &catalog, |s| {
            s.record("Q01", Some("Left")).unwrap();
            s.submit(&catalog)
        });
        assert_eq!(used, token);
        assert!(submitted.unwrap().is_ok());
        assert!(registry.is_empty());

        std::thread::sleep(Duration::from_millis(40));

        let mut called = false;
        let (used, replay) = registry.with_session_or_open(Some(token), &catalog, |_| {
            called = true;
        });
        assert_eq!(used, token);
        assert_eq!(replay, Err(ValidationError::AlreadySubmitted));
        assert!(!called);
        assert!(registry.is_empty());
    }
}
