// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default high-water mark for count strategies (one chunk)
pub const DEFAULT_COUNT_HIGH_WATER_MARK: f64 = 1.0;
/// Default high-water mark for byte-length strategies (16 KiB)
pub const DEFAULT_BYTE_LENGTH_HIGH_WATER_MARK: f64 = 16_384.0;
