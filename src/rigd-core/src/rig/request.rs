// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use crate::rig::field::{FieldValue, RigField};

/// Pending write handed to the daemon through the request channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RigRequest {
    pub value: FieldValue,
    /// Submission order, increasing across all fields.
    pub seq: u64,
}

impl RigRequest {
    pub fn field(&self) -> RigField {
        self.value.field()
    }
}
