//! Canned-answer lookup.

use helpdesk_core::FaqEntry;
use helpdesk_store::{StoreError, TicketStore};

/// Finds the first eligible FAQ entry. No relevance ranking beyond
/// "most recently added first".
pub struct FaqMatcher<'a> {
    store: &'a dyn TicketStore,
}

impl<'a> FaqMatcher<'a> {
    pub fn new(store: &'a dyn TicketStore) -> Self {
        Self { store }
    }

    /// Auto-resolvable entry in `language`, narrowed to `category` when given.
    ///
    /// FAQ entries carry no request type, so `_request_type` does not narrow
    /// the result.
    pub fn find_best_match(
        &self,
        category: Option<&str>,
        language: &str,
        _request_type: Option<&str>,
    ) -> Result<Option<FaqEntry>, StoreError> {
        let entries = self.store.list_faq(Some(language))?;
        Ok(entries.into_iter().find(|entry| {
            entry.auto_resolvable
                && entry.language == language
                && category.is_none_or(|c| entry.category_code.as_deref() == Some(c))
        }))
    }
}
