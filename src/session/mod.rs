//! Cookie-backed conversation sessions.
//!
//! A browser's conversation is identified solely by the `conversationId`
//! cookie.  [`SessionManager::resolve`] turns the raw `Cookie` header into
//! a conversation id, minting a new conversation when none is present.

pub mod locks;

use tracing::info;

use crate::error::ChatError;
use crate::store::ChatStore;

pub use locks::ConversationLocks;

pub const COOKIE_NAME: &str = "conversationId";
pub const DEFAULT_MAX_AGE_DAYS: u64 = 30;

/// A validated conversation id carried by the cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken(i64);

impl SessionToken {
    /// Parse a cookie value.  Must be a base-10 integer `> 0`.
    pub fn parse(raw: &str) -> Result<Self, ChatError> {
        match raw.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(SessionToken(id)),
            _ => Err(ChatError::InvalidSession(raw.to_string())),
        }
    }

    pub fn from_id(id: i64) -> Result<Self, ChatError> {
        if id <= 0 {
            return Err(ChatError::InvalidSession(id.to_string()));
        }
        Ok(SessionToken(id))
    }

    pub fn id(self) -> i64 {
        self.0
    }
}

/// `Set-Cookie` directive for a freshly minted conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub token: SessionToken,
    pub max_age_secs: u64,
    pub path: &'static str,
}

impl SessionCookie {
    /// Header value, e.g. `conversationId=7; Max-Age=2592000; Path=/`.
    pub fn header_value(&self) -> String {
        format!(
            "{COOKIE_NAME}={}; Max-Age={}; Path={}",
            self.token.id(),
            self.max_age_secs,
            self.path
        )
    }
}

/// Value of cookie `name` inside a `Cookie` header, if present.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k.trim() == name).then(|| v.trim())
    })
}

/// Outcome of resolving a request's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    pub conversation_id: i64,
    /// Present only when a new conversation was created.
    pub set_cookie: Option<SessionCookie>,
}

#[derive(Debug, Clone)]
pub struct SessionManager {
    max_age_secs: u64,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE_DAYS)
    }
}

impl SessionManager {
    pub fn new(max_age_days: u64) -> Self {
        Self {
            max_age_secs: max_age_days.saturating_mul(24 * 60 * 60),
        }
    }

    pub fn max_age_secs(&self) -> u64 {
        self.max_age_secs
    }

    /// Resolve the conversation for a request.
    ///
    /// * cookie absent (or empty) → create a conversation, return a cookie
    /// * cookie a positive integer → use it, no cookie
    /// * anything else → [`ChatError::InvalidSession`], nothing created
    pub async fn resolve(
        &self,
        cookie_header: Option<&str>,
        store: &dyn ChatStore,
    ) -> Result<ResolvedSession, ChatError> {
        let raw = cookie_header
            .and_then(|h| find_cookie(h, COOKIE_NAME))
            .filter(|v| !v.is_empty());

        if let Some(raw) = raw {
            let token = SessionToken::parse(raw)?;
            return Ok(ResolvedSession {
                conversation_id: token.id(),
                set_cookie: None,
            });
        }

        let id = store.create_conversation().await?;
        let token = SessionToken::from_id(id)
            .map_err(|_| ChatError::Persistence(format!("store returned invalid id {id}")))?;
        info!(conversation_id = id, "new conversation started");
        Ok(ResolvedSession {
            conversation_id: id,
            set_cookie: Some(SessionCookie {
                token,
                max_age_secs: self.max_age_secs,
                path: "/",
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    #[test]
    fn parse_accepts_positive_integers() {
        assert_eq!(SessionToken::parse("42").unwrap().id(), 42);
        assert_eq!(SessionToken::parse(" 7 ").unwrap().id(), 7);
    }

    #[test]
    fn parse_rejects_garbage() {
        for raw in ["abc", "0", "-5", "3.5", "12abc", ""] {
            assert!(
                matches!(SessionToken::parse(raw), Err(ChatError::InvalidSession(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn max_age_saturates() {
        assert_eq!(SessionManager::default().max_age_secs(), 2_592_000);
        assert_eq!(SessionManager::new(u64::MAX).max_age_secs(), u64::MAX);
    }

    #[test]
    fn find_cookie_picks_named_pair() {
        let header = "theme=dark; conversationId=12; other=x";
        assert_eq!(find_cookie(header, COOKIE_NAME), Some("12"));
        assert_eq!(find_cookie("theme=dark", COOKIE_NAME), None);
        assert_eq!(find_cookie("conversationId=", COOKIE_NAME), Some(""));
    }

    #[test]
    fn cookie_header_value() {
        let cookie = SessionCookie {
            token: SessionToken::from_id(3).unwrap(),
            max_age_secs: SessionManager::default().max_age_secs(),
            path: "/",
        };
        assert_eq!(
            cookie.header_value(),
            "conversationId=3; Max-Age=2592000; Path=/"
        );
    }

    #[tokio::test]
    async fn missing_cookie_creates_conversation() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sessions = SessionManager::default();
        let resolved = sessions.resolve(None, &store).await.unwrap();
        assert!(resolved.conversation_id > 0);
        let cookie = resolved.set_cookie.unwrap();
        assert_eq!(cookie.token.id(), resolved.conversation_id);
        assert_eq!(store.conversation_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_cookie_value_counts_as_missing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let resolved = SessionManager::default()
            .resolve(Some("conversationId="), &store)
            .await
            .unwrap();
        assert!(resolved.set_cookie.is_some());
    }

    #[tokio::test]
    async fn existing_cookie_is_reused() {
        let store = SqliteStore::open_in_memory().unwrap();
        let resolved = SessionManager::default()
            .resolve(Some("conversationId=9"), &store)
            .await
            .unwrap();
        assert_eq!(resolved.conversation_id, 9);
        assert!(resolved.set_cookie.is_none());
        assert_eq!(store.conversation_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_cookie_creates_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = SessionManager::default()
            .resolve(Some("conversationId=abc"), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidSession(_)));
        assert_eq!(store.conversation_count().await.unwrap(), 0);
    }
}
