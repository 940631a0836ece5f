use axum::Router;

/// A service module that contributes HTTP routes.
///
/// The binary entry point collects all modules and merges their routes
/// into one router.
pub trait Module: Send + Sync {
    /// Module name, used for logging.
    fn name(&self) -> &str;

    /// Return the module's routes.
    fn routes(&self) -> Router;
}
