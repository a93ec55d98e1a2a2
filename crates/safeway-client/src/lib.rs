//! App-side logic for SafeWay.
//!
//! Everything a screen needs that is not rendering: the typed API client,
//! optimistic list removal, the session value, device capabilities
//! (platform, SMS, location), the SOS trigger, the versioned local store,
//! and the route search and navigation flows.

pub mod api;
pub mod error;
pub mod lists;
pub mod local_store;
pub mod navigation;
pub mod platform;
pub mod search;
pub mod session;
pub mod sos;
pub mod types;

pub use api::ApiClient;
pub use error::ClientError;
pub use lists::{clear_history_list, remove_contact, remove_history_entry};
pub use local_store::{LocalStore, Place, StoreError, STORE_VERSION};
pub use navigation::{start_navigation, NavigationOutcome, NavigationRequest};
pub use platform::Platform;
pub use search::{search_routes, RouteOptions};
pub use session::{Session, SessionUser};
pub use sos::{
    location_label, SmsComposer, SosAction, SosConfig, SosError, SosState, SosTrigger,
};
pub use types::{
    AuthPayload, Comment, EmergencyContact, HistoryEntry, LikeState, NewHistoryEntry, NewReport,
    Report, UserProfile,
};
