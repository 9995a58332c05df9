// Copyright 2017 The Ray Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Spilled-object URL codec: `<base-url>?offset=<uint64>&size=<uint64>`.
//!
//! `base_url` is opaque to the local object manager; two URLs share a
//! fused file iff their base-url strings are byte-equal.

use std::fmt;

/// A parsed spilled-object URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUrl {
    pub base_url: String,
    pub offset: u64,
    pub size: u64,
}

impl ObjectUrl {
    pub fn new(base_url: impl Into<String>, offset: u64, size: u64) -> Self {
        Self {
            base_url: base_url.into(),
            offset,
            size,
        }
    }

    /// Parse a URL of the form `{base_url}?offset={offset}&size={size}`.
    ///
    /// Returns `None` for anything that doesn't match exactly: missing
    /// query string, a parameter other than `offset`/`size`, a parameter
    /// appearing more or less than once, or a `size` that overflows a
    /// non-negative `i64`.
    pub fn parse(url: &str) -> Option<Self> {
        let query_pos = url.rfind('?')?;
        let base_url = &url[..query_pos];
        let query_string = &url[query_pos + 1..];

        let mut offset: Option<u64> = None;
        let mut size: Option<u64> = None;
        let mut param_count = 0;

        for param in query_string.split('&') {
            param_count += 1;
            let mut parts = param.splitn(2, '=');
            let (key, value) = match (parts.next(), parts.next()) {
                (Some(k), Some(v)) => (k, v),
                _ => return None,
            };

            match key {
                "offset" => {
                    offset = Some(value.parse().ok()?);
                }
                "size" => {
                    let parsed: i128 = value.parse().ok()?;
                    if parsed < 0 || parsed > i64::MAX as i128 {
                        return None;
                    }
                    size = Some(parsed as u64);
                }
                _ => return None,
            }
        }

        if param_count != 2 {
            return None;
        }

        match (offset, size) {
            (Some(offset), Some(size)) => Some(Self {
                base_url: base_url.to_string(),
                offset,
                size,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?offset={}&size={}", self.base_url, self.offset, self.size)
    }
}
