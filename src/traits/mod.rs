// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod sink;
pub mod source;
pub mod transformer;

pub use sink::UnderlyingSink;
pub use source::UnderlyingSource;
pub use transformer::{IdentityTransformer, Transformer};
