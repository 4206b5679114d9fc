//! Error type for NoC routing.

/// Errors from building a NoC model or routing a flow over it.
#[derive(Debug, thiserror::Error)]
pub enum NocError {
    /// The routing algorithm name is not known.
    #[error("NoC routing algorithm \"{name}\" is not supported. Supported: {supported}")]
    UnknownAlgorithm {
        /// The requested name.
        name: String,
        /// Comma-separated list of valid names.
        supported: String,
    },

    /// No router carries the given user ID.
    #[error("no NoC router with ID {0}")]
    UnknownRouter(u32),

    /// Two routers were given the same user ID.
    #[error("duplicate NoC router ID {0}")]
    DuplicateRouter(u32),

    /// The walk from source to destination got stuck.
    #[error("no route from router {src} to router {dst} using {algorithm}")]
    NoRoute {
        /// User ID of the source router.
        src: u32,
        /// User ID of the destination router.
        dst: u32,
        /// Name of the routing algorithm.
        algorithm: &'static str,
    },
}
