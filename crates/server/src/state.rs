use vigil_backend::Registry;

/// Shared read-only state: the backend adapter table, populated once at
/// startup.
pub struct AppState {
    pub registry: Registry,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}
