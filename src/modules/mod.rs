pub mod auth;
pub mod books;
pub mod users;

use bookbuddy_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) {
    registry.register_custom(auth::create_module(state.clone()));
    registry.register_custom(books::create_module(state.clone()));
    registry.register_custom(users::create_module(state.clone()));
}
