//! In-memory edit state for the account form.
//!
//! `EditState` is the component-local projection of a profile: the three
//! editable fields plus a busy flag. It is populated wholesale by a
//! successful load, mutated one field at a time by the form, and never
//! reset explicitly. It goes away with its owner.

use crate::types::ProfileFields;

/// Editable profile fields and the `loading` flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditState {
    fields: ProfileFields,
    loading: bool,
}

impl EditState {
    /// Empty state: every field unset, not loading.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current username.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.fields.username.as_deref()
    }

    /// Current website.
    #[must_use]
    pub fn website(&self) -> Option<&str> {
        self.fields.website.as_deref()
    }

    /// Current avatar URL.
    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.fields.avatar_url.as_deref()
    }

    /// Whether a store operation is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replace the username. Empty strings are accepted as-is.
    pub fn set_username(&mut self, username: Option<String>) {
        self.fields.username = username;
    }

    /// Replace the website. No URL validation is applied.
    pub fn set_website(&mut self, website: Option<String>) {
        self.fields.website = website;
    }

    /// Replace the avatar URL.
    pub fn set_avatar_url(&mut self, avatar_url: Option<String>) {
        self.fields.avatar_url = avatar_url;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Replace all three fields at once, leaving `loading` alone.
    pub fn replace_fields(&mut self, fields: ProfileFields) {
        self.fields = fields;
    }

    /// A copy of the editable fields.
    #[must_use]
    pub fn fields(&self) -> ProfileFields {
        self.fields.clone()
    }

    /// Borrow the editable fields.
    #[must_use]
    pub const fn fields_ref(&self) -> &ProfileFields {
        &self.fields
    }
}
