// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::transform::TransformStreamDefaultController;
use crate::errors::StreamError;
use crate::traits::Transformer;

/// Case conversion applied by [`ChangeTextCaseTransformer`]
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    Upper,
    Lower,
    /// First letter of each word capitalized
    Proper,
    /// Like proper, but short articles and prepositions stay lowercase
    Title,
}

/// Change Text Case transformer - converts each chunk to a different case
pub struct ChangeTextCaseTransformer {
    case_type: CaseType,
}

impl ChangeTextCaseTransformer {
    pub fn new(case_type: CaseType) -> Self {
        Self { case_type }
    }

    pub fn upper() -> Self {
        Self::new(CaseType::Upper)
    }

    pub fn lower() -> Self {
        Self::new(CaseType::Lower)
    }

    pub fn proper() -> Self {
        Self::new(CaseType::Proper)
    }

    pub fn title() -> Self {
        Self::new(CaseType::Title)
    }

    pub fn convert(&self, input: &str) -> String {
        match self.case_type {
            CaseType::Upper => input.to_uppercase(),
            CaseType::Lower => input.to_lowercase(),
            CaseType::Proper => input
                .split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
            CaseType::Title => input
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| {
                    let lower_word = word.to_lowercase();
                    if i == 0 || !is_minor_word(&lower_word) {
                        capitalize(word)
                    } else {
                        lower_word
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

fn is_minor_word(word: &str) -> bool {
    matches!(
        word,
        "a"
            | "an"
            | "the"
            | "and"
            | "or"
            | "but"
            | "in"
            | "on"
            | "at"
            | "to"
            | "for"
            | "of"
            | "with"
            | "by"
    )
}

#[async_trait]
impl Transformer<String, String> for ChangeTextCaseTransformer {
    async fn transform(
        &self,
        chunk: String,
        controller: &TransformStreamDefaultController<String>,
    ) -> Result<(), StreamError> {
        controller.enqueue(self.convert(&chunk))
    }

    fn name(&self) -> &'static str {
        match self.case_type {
            CaseType::Upper => "change_text_case_upper",
            CaseType::Lower => "change_text_case_lower",
            CaseType::Proper => "change_text_case_proper",
            CaseType::Title => "change_text_case_title",
        }
    }
}
