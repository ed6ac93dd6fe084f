// Domain-layer modules and shared errors/models
pub mod request_builder {
    pub use crate::request_builder::*;
}

pub mod batching {
    pub use crate::batching::*;
}

pub mod merger {
    pub use crate::merger::*;
}

pub mod pagination {
    pub use crate::pagination::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod services {
    pub use crate::services::*;
}

pub mod errors {
    pub use crate::errors::*;
}
