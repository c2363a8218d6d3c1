// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for property-based testing.

use proptest::prelude::*;

/// Strategy for chat message contents.
pub fn content_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,40}"
}

/// Queue contents paired with which entries fail redelivery.
pub fn drain_plan_strategy() -> impl Strategy<Value = Vec<(String, bool)>> {
    prop::collection::vec((content_strategy(), any::<bool>()), 0..20)
}
