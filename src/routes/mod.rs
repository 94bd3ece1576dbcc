/// Router Module Index
///
/// Routes are grouped by how access is decided, so the guard for each group is applied
/// once at the router level rather than remembered per handler.

/// Pages anyone may load. Presentational shells, login, health and the seeding placeholder.
pub mod public;

/// Pages that evaluate a gate inside the handler (the ban notice) and the session API.
pub mod gated;

/// The moderation section. Every route in it sits behind the `require_moderator` layout guard.
pub mod moderation;
