//! The acting user behind a comment mutation.

/// Who is performing a mutation, as far as the comment model cares.
///
/// The identity crate resolves request credentials; the API layer turns the
/// result into an `Actor`. Email is the natural key: there is no account store,
/// so an address change detaches a user from their earlier comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Display name written into `author`.
    pub display_name: String,
    /// Stable key written into `resolvedBy` / `editedBy`.
    pub email: String,
    /// Identifier written into `authorId` (verified actors only).
    pub id: String,
    /// Whether the identity came from a verified credential. The development
    /// fallback is not verified and never stamps `authorEmail`/`authorId`.
    pub verified: bool,
}

impl Actor {
    pub fn verified(display_name: impl Into<String>, email: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            email: email.into(),
            id: id.into(),
            verified: true,
        }
    }

    pub fn unverified(display_name: impl Into<String>, email: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            email: email.into(),
            id: id.into(),
            verified: false,
        }
    }
}
