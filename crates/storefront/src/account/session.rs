//! Customer session.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use headless_cart_core::Email;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::shopify::types::{Customer, CustomerAccessToken, NewCustomer, OrderConnection};
use crate::store::{CUSTOMER_TOKEN_KEY, KeyValueStore, StoreError, load_json, save_json};

use super::{AccountBackend, AccountError};

/// Token lifetime assumed when Shopify's expiry cannot be parsed.
const TOKEN_EXPIRY_DAYS: i64 = 30;

/// Largest order page Shopify serves.
const MAX_ORDERS_PAGE: i64 = 250;

/// Customer token as persisted between runs.
#[derive(Clone, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn from_token(token: &CustomerAccessToken, now: DateTime<Utc>) -> Self {
        let expires_at = DateTime::parse_from_rfc3339(&token.expires_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|e| {
                warn!(expires_at = %token.expires_at, error = %e, "Unparseable token expiry");
                now + TimeDelta::days(TOKEN_EXPIRY_DAYS)
            });
        Self {
            access_token: token.access_token.expose_secret().to_string(),
            expires_at,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Default)]
struct State {
    token: Option<SecretString>,
    customer: Option<Customer>,
    loading: bool,
    last_error: Option<String>,
}

/// The signed-in customer, if any.
///
/// Authenticated means a token is held **and** its customer profile loaded.
pub struct AccountSession<B, S> {
    backend: Arc<B>,
    store: Arc<S>,
    state: Mutex<State>,
}

impl<B, S> AccountSession<B, S>
where
    B: AccountBackend,
    S: KeyValueStore,
{
    /// Create a signed-out session.
    pub fn new(backend: Arc<B>, store: Arc<S>) -> Self {
        Self {
            backend,
            store,
            state: Mutex::new(State::default()),
        }
    }

    /// The signed-in customer's profile.
    pub fn customer(&self) -> Option<Customer> {
        self.with_state(|s| s.customer.clone())
    }

    /// The customer access token, for cart buyer identity.
    pub fn access_token(&self) -> Option<SecretString> {
        self.with_state(|s| s.token.clone())
    }

    /// Whether a customer is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.with_state(|s| s.token.is_some() && s.customer.is_some())
    }

    /// Whether a sign-in or registration is in flight.
    pub fn is_loading(&self) -> bool {
        self.with_state(|s| s.loading)
    }

    /// Message of the last failed operation.
    pub fn last_error(&self) -> Option<String> {
        self.with_state(|s| s.last_error.clone())
    }

    /// Resume the session persisted by an earlier run.
    ///
    /// Expired or rejected tokens are discarded and the session stays signed
    /// out.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local store fails.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<Customer>, AccountError> {
        let stored: Option<StoredToken> = match load_json(&*self.store, CUSTOMER_TOKEN_KEY).await
        {
            Ok(t) => t,
            Err(StoreError::Serde(e)) => {
                warn!(error = %e, "Discarding unreadable customer token");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let Some(stored) = stored else {
            return Ok(None);
        };
        if stored.is_expired(Utc::now()) {
            info!(expired_at = %stored.expires_at, "Stored customer token expired");
            self.clear_local().await?;
            return Ok(None);
        }

        let token = SecretString::from(stored.access_token);
        self.with_state(|s| s.token = Some(token.clone()));

        match self.load_customer(&token).await {
            Ok(customer) => Ok(Some(customer)),
            Err(e) => {
                warn!(error = %e, "Stored customer token rejected");
                self.clear_local().await?;
                Ok(None)
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// `InvalidEmail` before any remote call; `Rejected` with Shopify's
    /// message for bad credentials.
    #[instrument(skip(self, email, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Customer, AccountError> {
        let _loading = self.begin();
        let result = async {
            let email = Email::parse(email)?;
            self.login_with(&email, password).await
        }
        .await;
        result.map_err(|e| self.fail(e))
    }

    /// Register a new customer, then sign in.
    ///
    /// New customers are opted into marketing.
    ///
    /// # Errors
    ///
    /// `InvalidEmail` before any remote call; `Rejected` if Shopify refuses
    /// the registration (e.g., email already taken).
    #[instrument(skip(self, first_name, last_name, email, password))]
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<Customer, AccountError> {
        let _loading = self.begin();
        let result = async {
            let customer = NewCustomer {
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                email: Email::parse(email)?,
                accepts_marketing: true,
            };
            let id = self.backend.create_customer(&customer, password).await?;
            info!(customer_id = %id, "Customer registered");
            self.login_with(&customer.email, password).await
        }
        .await;
        result.map_err(|e| self.fail(e))
    }

    /// Sign out.
    ///
    /// The token is forgotten locally first; revoking it at Shopify is best
    /// effort.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local store fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AccountError> {
        let token = self.with_state(|s| s.token.take());
        self.clear_local().await?;

        if let Some(token) = token
            && let Err(e) = self.backend.delete_access_token(&token).await
        {
            warn!(error = %e, "Failed to revoke customer token");
        }
        Ok(())
    }

    /// A page of the signed-in customer's orders.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` without a token, `InvalidPageSize` outside 1..=250,
    /// `SessionExpired` if Shopify no longer accepts the token.
    #[instrument(skip(self, after))]
    pub async fn orders(
        &self,
        first: i64,
        after: Option<String>,
    ) -> Result<OrderConnection, AccountError> {
        if !(1..=MAX_ORDERS_PAGE).contains(&first) {
            return Err(self.fail(AccountError::InvalidPageSize(first)));
        }
        let Some(token) = self.access_token() else {
            return Err(self.fail(AccountError::NotAuthenticated));
        };

        match self.backend.orders(&token, first, after).await {
            Ok(Some(orders)) => Ok(orders),
            Ok(None) => Err(self.fail(AccountError::SessionExpired)),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    async fn login_with(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Customer, AccountError> {
        let token = self.backend.create_access_token(email, password).await?;
        let stored = StoredToken::from_token(&token, Utc::now());
        save_json(&*self.store, CUSTOMER_TOKEN_KEY, &stored).await?;
        self.with_state(|s| s.token = Some(token.access_token.clone()));

        match self.load_customer(&token.access_token).await {
            Ok(customer) => {
                info!(customer_id = %customer.id, "Customer signed in");
                Ok(customer)
            }
            Err(e) => {
                self.clear_local().await?;
                Err(e)
            }
        }
    }

    async fn load_customer(&self, token: &SecretString) -> Result<Customer, AccountError> {
        let customer = self
            .backend
            .customer(token)
            .await?
            .ok_or(AccountError::SessionExpired)?;
        self.with_state(|s| s.customer = Some(customer.clone()));
        Ok(customer)
    }

    async fn clear_local(&self) -> Result<(), AccountError> {
        self.with_state(|s| {
            s.token = None;
            s.customer = None;
        });
        self.store.remove(CUSTOMER_TOKEN_KEY).await?;
        Ok(())
    }

    fn fail(&self, error: AccountError) -> AccountError {
        warn!(error = %error, "Account operation failed");
        self.with_state(|s| s.last_error = Some(error.to_string()));
        error
    }

    fn begin(&self) -> LoadingGuard<'_> {
        self.with_state(|s| {
            s.loading = true;
            s.last_error = None;
        });
        LoadingGuard { state: &self.state }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

struct LoadingGuard<'a> {
    state: &'a Mutex<State>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .loading = false;
    }
}
