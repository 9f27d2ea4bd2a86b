//! Profile owned by a user

/// Optional public details of a user. Each field is independently settable.
///
/// A profile has no identity of its own; it lives and dies with its owning
/// [`User`](super::User) and is only changed through the owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    bio: Option<String>,
    avatar_url: Option<String>,
    location: Option<String>,
}

impl Profile {
    /// A profile with every field unset
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(bio: Option<String>, avatar_url: Option<String>, location: Option<String>) -> Self {
        Self {
            bio,
            avatar_url,
            location,
        }
    }

    pub fn bio(&self) -> Option<&str> {
        self.bio.as_deref()
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.bio.is_none() && self.avatar_url.is_none() && self.location.is_none()
    }

    pub(super) fn update(
        &mut self,
        bio: Option<String>,
        location: Option<String>,
        avatar_url: Option<String>,
    ) {
        self.bio = bio;
        self.location = location;
        self.avatar_url = avatar_url;
    }
}
