//! Effects returned by the reducer for the runtime to execute.
//!
//! Every backend call is an effect; the reducer itself never awaits.

use authgate_core::backend::User;

use crate::notice::Notice;
use crate::request_id::RequestId;

#[derive(Debug)]
pub enum ScreenEffect {
    /// Cleanup, best-effort global sign-out, then password sign-in.
    SignIn {
        request: RequestId,
        email: String,
        password: String,
    },
    ResetPassword {
        request: RequestId,
        email: String,
    },
    /// Read the consent flags of `user`.
    CheckConsent { request: RequestId, user: User },
    /// Read the routing fields of `user` and finish the screen.
    Redirect { request: RequestId, user: User },
    ShowNotice(Notice),
}
