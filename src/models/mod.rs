// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay state and persistent settings.

pub mod overlay;
pub mod settings;
