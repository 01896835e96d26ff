use axum::http::{header, HeaderMap, HeaderValue};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::SessionConfig;
use crate::session::{Session, SessionId, SessionStore};

/// The visitor's session, shared between the gate middleware and handlers
/// for the duration of one request
#[derive(Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    pub session: Arc<Mutex<Session>>,
    /// True when the visitor did not present a usable session cookie
    pub is_new: bool,
}

impl SessionHandle {
    /// Load the visitor's session. Unknown, idle or unreadable sessions start
    /// empty under a fresh id, which leaves every protected page locked.
    pub async fn load(headers: &HeaderMap, store: &dyn SessionStore, config: &SessionConfig) -> Self {
        if let Some(id) = session_id_from_headers(headers, &config.cookie_name) {
            match store.load(&id).await {
                Ok(Some(session)) => {
                    return Self {
                        id,
                        session: Arc::new(Mutex::new(session)),
                        is_new: false,
                    };
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to load session, starting a new one: {}", e),
            }
        }

        Self {
            id: SessionId::generate(),
            session: Arc::new(Mutex::new(Session::new())),
            is_new: true,
        }
    }

    /// Save the session if this request changed it, otherwise only refresh
    /// its idle timer. Returns the cookie to set, if any.
    pub async fn persist(&self, store: &dyn SessionStore, config: &SessionConfig) -> Option<HeaderValue> {
        let mut session = self.session.lock().await;
        if !session.is_modified() {
            if !self.is_new {
                if let Err(e) = store.touch(&self.id).await {
                    tracing::warn!("Failed to refresh session {}: {}", self.id, e);
                }
            }
            return None;
        }
        if let Err(e) = store.save(&self.id, &session).await {
            tracing::error!("Failed to save session {}: {}", self.id, e);
            return None;
        }
        session.mark_saved();

        if self.is_new {
            session_cookie(&self.id, config)
        } else {
            None
        }
    }
}

/// Session id from the `Cookie` header, ignoring malformed values
pub fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == cookie_name).then(|| value.trim().trim_matches('"'))
        })
        .find_map(SessionId::parse)
}

pub fn session_cookie(id: &SessionId, config: &SessionConfig) -> Option<HeaderValue> {
    cookie_header(&format!("{}={}; Path=/; HttpOnly; SameSite=Lax", config.cookie_name, id), config)
}

/// Cookie telling the browser to drop the session cookie
pub fn expired_session_cookie(config: &SessionConfig) -> Option<HeaderValue> {
    cookie_header(&format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", config.cookie_name), config)
}

fn cookie_header(cookie: &str, config: &SessionConfig) -> Option<HeaderValue> {
    let mut cookie = cookie.to_string();
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}
