//! Context provider plugin contract.
//!
//! ```rust
//! use fcommon::{BoxFuture, CancellationToken};
//! use fcontext::{AiContext, ContextError, ContextProvider, InvokingContext};
//!
//! struct Tenant;
//!
//! impl ContextProvider for Tenant {
//!     fn name(&self) -> &str {
//!         "tenant"
//!     }
//!
//!     fn priority(&self) -> i32 {
//!         5
//!     }
//!
//!     fn on_invoking<'a>(
//!         &'a self,
//!         _context: &'a InvokingContext<'a>,
//!         _cancel: &'a CancellationToken,
//!     ) -> BoxFuture<'a, Result<Option<AiContext>, ContextError>> {
//!         Box::pin(async { Ok(Some(AiContext::new().with_metadata("tenant", "acme"))) })
//!     }
//! }
//!
//! assert_eq!(Tenant.priority(), 5);
//! ```

use fcommon::{BoxFuture, CancellationToken};

use crate::{AiContext, ContextError, InvokedContext, InvokingContext};

/// A pluggable unit run around every model call.
///
/// Lower priorities run first before the call and last after it. Returning
/// `Ok(None)` from [`ContextProvider::on_invoking`] means no contribution.
pub trait ContextProvider: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> i32 {
        0
    }

    fn on_invoking<'a>(
        &'a self,
        _context: &'a InvokingContext<'a>,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<AiContext>, ContextError>> {
        Box::pin(async { Ok(None) })
    }

    fn on_invoked<'a>(
        &'a self,
        _context: &'a InvokedContext<'a>,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), ContextError>> {
        Box::pin(async { Ok(()) })
    }
}
