// core/src/access.rs

//! Per-request access decisions. Authentication always runs first, so a
//! request with no valid credential is `Unauthenticated` even when it also
//! targets someone else's data.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{MarketError, Result};
use crate::identity::{Identity, IdentityVerifier};

/// Who an operation's data belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
  /// Any verified caller.
  Authenticated,
  /// Only the caller whose email matches.
  Subject(&'a str),
}

#[derive(Clone)]
pub struct AccessGate {
  verifier: Arc<dyn IdentityVerifier>,
}

impl std::fmt::Debug for AccessGate {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AccessGate").finish_non_exhaustive()
  }
}

impl AccessGate {
  pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
    Self { verifier }
  }

  pub fn authenticate(&self, credential: Option<&str>) -> Result<Identity> {
    self.verifier.verify(credential).map_err(|err| {
      debug!(error = %err, "Credential rejected.");
      match err {
        MarketError::Unauthenticated { .. } => err,
        other => MarketError::unauthenticated(other.to_string()),
      }
    })
  }

  pub fn authorize(&self, identity: &Identity, scope: Scope<'_>) -> Result<()> {
    match scope {
      Scope::Authenticated => Ok(()),
      Scope::Subject(subject) if subject.trim() == identity.email.trim() => Ok(()),
      Scope::Subject(subject) => {
        warn!(caller = %identity.email, subject = %subject, "Access to another subject's data refused.");
        Err(MarketError::Forbidden)
      }
    }
  }

  /// Authenticates, authorizes, and only then runs `op` with the verified
  /// identity. `op` is never invoked when either check fails.
  pub async fn guard<T, F, Fut>(&self, credential: Option<&str>, scope: Scope<'_>, op: F) -> Result<T>
  where
    F: FnOnce(Identity) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
  {
    let identity = self.authenticate(credential)?;
    self.authorize(&identity, scope)?;
    op(identity).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, Utc};
  use std::sync::atomic::{AtomicBool, Ordering};

  /// Accepts any credential of the form `email:<addr>`.
  struct StaticVerifier;

  impl IdentityVerifier for StaticVerifier {
    fn verify(&self, credential: Option<&str>) -> Result<Identity> {
      let email = credential
        .and_then(|c| c.strip_prefix("email:"))
        .ok_or_else(|| MarketError::unauthenticated("bad credential"))?;
      Ok(Identity {
        email: email.to_string(),
        name: None,
        expires_at: Utc::now() + Duration::hours(1),
      })
    }
  }

  fn gate() -> AccessGate {
    AccessGate::new(Arc::new(StaticVerifier))
  }

  #[test]
  fn subject_scope_requires_matching_email() {
    let gate = gate();
    let alice = gate.authenticate(Some("email:a@x.com")).unwrap();
    assert!(gate.authorize(&alice, Scope::Subject("a@x.com")).is_ok());
    assert!(matches!(
      gate.authorize(&alice, Scope::Subject("b@x.com")),
      Err(MarketError::Forbidden)
    ));
    assert!(gate.authorize(&alice, Scope::Authenticated).is_ok());
  }

  #[tokio::test]
  async fn unauthenticated_wins_over_forbidden() {
    let ran = AtomicBool::new(false);
    let result = gate()
      .guard(None, Scope::Subject("b@x.com"), |_| async {
        ran.store(true, Ordering::SeqCst);
        Ok(())
      })
      .await;
    assert!(matches!(result, Err(MarketError::Unauthenticated { .. })));
    assert!(!ran.load(Ordering::SeqCst));
  }

  #[tokio::test]
  async fn forbidden_caller_never_reaches_the_operation() {
    let ran = AtomicBool::new(false);
    let result = gate()
      .guard(Some("email:a@x.com"), Scope::Subject("b@x.com"), |_| async {
        ran.store(true, Ordering::SeqCst);
        Ok(())
      })
      .await;
    assert!(matches!(result, Err(MarketError::Forbidden)));
    assert!(!ran.load(Ordering::SeqCst));
  }

  #[tokio::test]
  async fn permitted_caller_gets_identity() {
    let email = gate()
      .guard(Some("email:a@x.com"), Scope::Subject("a@x.com"), |id| async move { Ok(id.email) })
      .await
      .unwrap();
    assert_eq!(email, "a@x.com");
  }
}
