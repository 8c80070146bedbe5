//! # Internal Macros
//!
//! This module provides internal macros for reducing boilerplate around the
//! zerocopy wire structs in [`crate::layout`].
//!
//! ## zerocopy_getters!
//!
//! Generates getter methods for zerocopy struct fields that use
//! little-endian wrapper types (U64).
//!
//! ### Usage
//!
//! ```ignore
//! use zerocopy::little_endian::U64;
//!
//! #[repr(C)]
//! struct InlineRef {
//!     offset: U64,
//!     count: U64,
//! }
//!
//! impl InlineRef {
//!     zerocopy_getters! {
//!         offset: u64,
//!         count: u64,
//!     }
//! }
//!
//! // Generates:
//! // pub fn offset(&self) -> u64 { self.offset.get() }
//! // pub fn count(&self) -> u64 { self.count.get() }
//! ```

/// Generates getter methods for zerocopy little-endian fields (read-only).
#[macro_export]
macro_rules! zerocopy_getters {
    ($($field:ident : $native_ty:ty),* $(,)?) => {
        $(
            #[inline]
            pub fn $field(&self) -> $native_ty {
                self.$field.get()
            }
        )*
    };
}
