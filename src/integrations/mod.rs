//! External service integrations.

pub mod explorium_client {
    pub use crate::explorium_client::*;
}

pub mod endpoints {
    pub use crate::endpoints::*;
}
