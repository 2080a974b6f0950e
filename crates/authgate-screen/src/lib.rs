//! Auth screen controller.
//!
//! Elm-style: [`update::update`] is a pure reducer over [`state::ScreenState`]
//! returning [`effects::ScreenEffect`]s, and [`runtime::AuthScreen`] executes
//! them against an [`authgate_core::backend::IdentityBackend`].

pub mod effects;
pub mod events;
pub mod notice;
pub mod request_id;
pub mod runtime;
pub mod state;
pub mod update;

pub use events::ScreenEvent;
pub use notice::{Notice, NoticeKind};
pub use runtime::{AuthScreen, Presenter};
pub use state::{AuthViewMode, ScreenExit, ScreenSettings, ScreenState};
