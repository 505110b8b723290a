// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Screen grabbing, media output, settings files and video capture.

pub mod media;
pub mod screen;
pub mod serialization;
pub mod video;
