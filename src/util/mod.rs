// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometry and animation helpers.

pub mod fade;
pub mod geometry;
