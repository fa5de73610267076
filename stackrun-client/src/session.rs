//! Remote session context

/// Authenticated context for talking to the stack backend
///
/// Established once per invocation before any operation starts and shared
/// read-only between all workers afterwards.
#[derive(Clone)]
pub struct Session {
    profile: Option<String>,
    principal: String,
    api_token: Option<String>,
}

impl Session {
    pub fn new(
        profile: Option<String>,
        principal: impl Into<String>,
        api_token: Option<String>,
    ) -> Self {
        Self {
            profile,
            principal: principal.into(),
            api_token,
        }
    }

    /// Named credential profile the session was established with
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Identity the backend authenticated
    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub(crate) fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("profile", &self.profile)
            .field("principal", &self.principal)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .finish()
    }
}
