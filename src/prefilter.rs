use crate::headers::{self, RequestHeaders};

/// Which header families a request carries.
///
/// Used both as the result of a request scan and as a strategy's
/// precondition: a strategy is only run when every family it requires is
/// present, which saves the work without changing any result (a strategy
/// missing its headers has no opinion anyway).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderFamilies {
    pub user_agent: bool,
    pub accept: bool,
    /// Any header parsed into `ClientHints` (`Sec-CH-*`, `DPR`, `ECT`, ...).
    pub client_hints: bool,
}

impl HeaderFamilies {
    /// No requirement: always run.
    pub const NONE: Self = Self {
        user_agent: false,
        accept: false,
        client_hints: false,
    };

    pub const USER_AGENT: Self = Self {
        user_agent: true,
        ..Self::NONE
    };

    pub const ACCEPT: Self = Self {
        accept: true,
        ..Self::NONE
    };

    pub fn scan(request: &dyn RequestHeaders) -> Self {
        Self {
            user_agent: request.first_header(&[headers::USER_AGENT]).is_some(),
            accept: request.first_header(&[headers::ACCEPT]).is_some(),
            client_hints: headers::has_any_hint_header(request),
        }
    }

    /// True if every family set in `required` is present here.
    pub fn satisfies(&self, required: HeaderFamilies) -> bool {
        (!required.user_agent || self.user_agent)
            && (!required.accept || self.accept)
            && (!required.client_hints || self.client_hints)
    }
}
