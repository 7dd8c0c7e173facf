//! # Modelbind Limits
//!
//! Request form limits for modelbind.
//!
//! A [`RequestFormLimits`] declaration becomes a [`RequestFormLimitsFilter`]
//! that runs at authorization time. When several declarations apply to one
//! action, only the most specific installs its [`FormOptions`] on the
//! request, as a [`FormFeature`]. The feature then enforces those limits
//! when the form is read.
//!
//! ## Example
//!
//! ```rust
//! use modelbind_core::HttpContext;
//! use modelbind_limits::{read_form, FilterScope, FormLimitsPolicies, RequestFormLimits};
//!
//! # tokio_test::block_on(async {
//! let mut policies = FormLimitsPolicies::new();
//! policies.register(
//!     RequestFormLimits::new().value_count_limit(2).build_filter(),
//!     FilterScope::Action,
//! );
//!
//! let mut http = HttpContext::builder()
//!     .content_type("application/x-www-form-urlencoded")
//!     .body("a=1&b=2&c=3")
//!     .build();
//!
//! policies.apply(&mut http).unwrap();
//! let err = read_form(&mut http).await.unwrap_err();
//! assert_eq!(err.to_string(), "Form value count limit 2 exceeded.");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/modelbind-limits/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod feature;
mod filter;
mod options;

pub use error::{FormError, LimitsError};
pub use feature::{read_form, FormCollection, FormFeature, FormFile};
pub use filter::{
    AuthorizationFilterContext, FilterDescriptor, FilterId, FilterScope, FormLimitsOutcome,
    FormLimitsPolicies, RequestFormLimitsFilter,
};
pub use options::{FormOptions, RequestFormLimits};
