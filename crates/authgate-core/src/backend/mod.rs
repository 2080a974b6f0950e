//! Identity backend interface.
//!
//! The screen only talks to the backend through [`IdentityBackend`]; the
//! backend owns the session and its storage key.

mod errors;
mod events;
pub mod supabase;
mod types;

use async_trait::async_trait;
pub use errors::{AuthError, SignInFailure};
pub use events::{EventHub, Subscription};
pub use supabase::SupabaseBackend;
pub use types::{
    AuthEvent, AuthSession, ConsentProfile, Profile, RoutingProfile, Session, SignOutScope, User,
};

pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Operations the auth screen needs from the identity backend.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Password grant. On success the session is persisted and `SignedIn` is published.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<AuthSession>;

    /// Revokes sessions. Must succeed when there is no session to revoke.
    async fn sign_out(&self, scope: SignOutScope) -> AuthResult<()>;

    async fn reset_password_for_email(&self, email: &str) -> AuthResult<()>;

    /// Registers for auth events until the returned handle is dropped.
    fn on_auth_state_change(&self) -> Subscription;

    /// User of the persisted session, if any.
    async fn current_user(&self) -> Option<User>;

    /// Reads the `profiles` row of `user_id`.
    async fn fetch_profile(&self, user_id: &str) -> AuthResult<Profile>;
}
