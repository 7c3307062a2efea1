//! Client-side half of the interaction layer: an optimistic store and the
//! HTTP transport it talks through.

pub mod error;
pub mod store;
pub mod transport;

pub use error::ClientError;
pub use store::{ArticleInteractionState, ButtonState, OptimisticStore, TogglePhase};
pub use transport::{Credentials, HttpTransport, InteractionTransport, ServerToggle};
