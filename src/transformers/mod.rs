// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in `String -> String` transformers, created by name through
//! [`TransformerFactory`].

pub mod change_text_case;
pub mod factory;
pub mod prefix_suffix_adder;
pub mod reverse_text;
pub mod split_words;
pub mod token_counter;

pub use change_text_case::*;
pub use factory::TransformerFactory;
pub use prefix_suffix_adder::*;
pub use reverse_text::*;
pub use split_words::*;
pub use token_counter::*;
